//! Marketaux 新闻

use crate::config::ProviderConfig;
use crate::error::UpstreamError;
use crate::models::NewsArticle;
use crate::services::adapter::adapt_all;
use crate::services::upstream::{Auth, UpstreamClient};

#[derive(Debug, Clone)]
pub struct MarketauxService {
    client: UpstreamClient,
}

impl MarketauxService {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: UpstreamClient::new("Marketaux", config, Auth::QueryParam("api_token")),
        }
    }

    /// 与指定代码相关的英文新闻
    pub async fn news(&self, symbols: &[String], limit: usize) -> Result<Vec<NewsArticle>, UpstreamError> {
        let query = [
            ("symbols", symbols.join(",")),
            ("filter_entities", "true".to_string()),
            ("language", "en".to_string()),
            ("limit", limit.to_string()),
        ];
        let raw = self.client.fetch("/news/all", &query).await?;
        Ok(adapt_all(&raw))
    }
}
