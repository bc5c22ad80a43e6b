//! Polygon 行情快照

use crate::config::ProviderConfig;
use crate::error::UpstreamError;
use crate::models::Quote;
use crate::services::adapter::adapt_all;
use crate::services::upstream::{Auth, UpstreamClient};

const SNAPSHOT_PATH: &str = "/v2/snapshot/locale/us/markets/stocks/tickers";

#[derive(Debug, Clone)]
pub struct PolygonService {
    client: UpstreamClient,
}

impl PolygonService {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: UpstreamClient::new("Polygon", config, Auth::QueryParam("apiKey")),
        }
    }

    /// 多个代码的最新快照，一次请求取回
    pub async fn snapshot(&self, tickers: &[String]) -> Result<Vec<Quote>, UpstreamError> {
        let raw = self
            .client
            .fetch(SNAPSHOT_PATH, &[("tickers", tickers.join(","))])
            .await?;
        Ok(adapt_all(&raw))
    }
}
