//! 自选股行情轮询
//!
//! - `QuoteCache`：按代码保存最近一次有效报价和连接状态，并通知订阅者
//! - `BatchPoller`：分批并发逐个拉取，同一代码同时最多一个在途请求
//! - `SnapshotPoller`：每轮一次批量调用，新一轮开始时中止上一轮

mod batch;
pub mod cache;
mod snapshot;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::models::Quote;

pub use batch::BatchPoller;
pub use cache::QuoteCache;
pub use snapshot::{SnapshotOutcome, SnapshotPoller};

/// 报价数据源
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 单个代码的实时报价
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, UpstreamError>;

    /// 一次调用取回多个代码的报价
    async fn fetch_batch(&self, symbols: &[String]) -> Result<Vec<Quote>, UpstreamError>;
}
