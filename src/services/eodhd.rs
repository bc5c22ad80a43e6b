//! EODHD 数据服务
//!
//! 实时报价、日线历史、经济日历、新闻，统一经字段适配后输出规范记录

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::UpstreamError;
use crate::models::{CalendarEvent, NewsArticle, PriceBar, Quote};
use crate::services::adapter::{adapt_all, Adapt};
use crate::services::feed::QuoteSource;
use crate::services::upstream::{Auth, UpstreamClient};

/// 日线查询条件
#[derive(Debug, Clone, Default)]
pub struct PriceRange {
    pub from: String,
    pub to: String,
    pub period: Option<String>,
}

/// 经济日历查询条件
#[derive(Debug, Clone, Default)]
pub struct CalendarFilter {
    pub from: String,
    pub to: String,
    pub country: Option<String>,
    pub limit: usize,
}

/// 新闻查询条件
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub symbols: Vec<String>,
    pub tags: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// EODHD 服务
#[derive(Debug, Clone)]
pub struct EodhdService {
    client: UpstreamClient,
}

impl EodhdService {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: UpstreamClient::new("EODHD", config, Auth::QueryParam("api_token"))
                .with_param("fmt", "json"),
        }
    }

    /// 批量实时报价
    ///
    /// 第一个代码放在路径中，其余通过 `s` 参数一次取回
    pub async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, UpstreamError> {
        let Some((first, rest)) = symbols.split_first() else {
            return Ok(Vec::new());
        };

        let mut query = Vec::new();
        if !rest.is_empty() {
            query.push(("s", rest.join(",")));
        }

        let raw = self.client.fetch(&format!("/real-time/{}", first), &query).await?;
        Ok(adapt_all(&raw))
    }

    /// 日线历史
    pub async fn prices(&self, symbol: &str, range: &PriceRange) -> Result<Vec<PriceBar>, UpstreamError> {
        let mut query = vec![("from", range.from.clone()), ("to", range.to.clone())];
        if let Some(period) = &range.period {
            query.push(("period", period.clone()));
        }

        let raw = self.client.fetch(&format!("/eod/{}", symbol), &query).await?;
        Ok(adapt_all(&raw))
    }

    /// 经济日历
    pub async fn calendar(&self, filter: &CalendarFilter) -> Result<Vec<CalendarEvent>, UpstreamError> {
        let mut query = vec![
            ("from", filter.from.clone()),
            ("to", filter.to.clone()),
            ("limit", filter.limit.to_string()),
        ];
        if let Some(country) = &filter.country {
            query.push(("country", country.clone()));
        }

        let raw = self.client.fetch("/economic-events", &query).await?;
        Ok(adapt_all(&raw))
    }

    /// 财经新闻
    pub async fn news(&self, filter: &NewsFilter) -> Result<Vec<NewsArticle>, UpstreamError> {
        let mut query = vec![
            ("limit", filter.limit.to_string()),
            ("offset", filter.offset.to_string()),
        ];
        if !filter.symbols.is_empty() {
            query.push(("s", filter.symbols.join(",")));
        }
        if !filter.tags.is_empty() {
            query.push(("t", filter.tags.join(",")));
        }
        if let Some(from) = &filter.from {
            query.push(("from", from.clone()));
        }
        if let Some(to) = &filter.to {
            query.push(("to", to.clone()));
        }

        let raw = self.client.fetch("/news", &query).await?;
        Ok(adapt_all(&raw))
    }
}

#[async_trait]
impl QuoteSource for EodhdService {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, UpstreamError> {
        let raw = self.client.fetch(&format!("/real-time/{}", symbol), &[]).await?;
        let mut quote = Quote::adapt(&raw);
        if quote.symbol.is_empty() {
            quote.symbol = symbol.to_string();
        }
        Ok(quote)
    }

    async fn fetch_batch(&self, symbols: &[String]) -> Result<Vec<Quote>, UpstreamError> {
        self.quotes(symbols).await
    }
}
