//! 最近有效报价缓存
//!
//! 拉取失败时不清除旧值，只更新连接状态，前端可以继续显示"最后已知"价格

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::UpstreamError;
use crate::models::Quote;

/// 单个代码的连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Live,
    /// 限流或上游返回异常数据
    Degraded,
    /// 网络不可达或超时
    Disconnected,
}

impl ConnectionStatus {
    pub fn from_error(err: &UpstreamError) -> Self {
        if err.is_connection_failure() {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Degraded
        }
    }
}

/// 缓存条目
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuote {
    pub symbol: String,
    /// 最近一次有效报价
    pub quote: Option<Quote>,
    pub status: ConnectionStatus,
    /// 最近一次有效报价的写入时间
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// 报价缓存及订阅表
#[derive(Default)]
pub struct QuoteCache {
    entries: RwLock<HashMap<String, CachedQuote>>,
    subscribers: Mutex<HashMap<String, Vec<UnboundedSender<Quote>>>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅某个代码的报价更新
    pub fn subscribe(&self, symbol: &str) -> UnboundedReceiver<Quote> {
        let (tx, rx) = unbounded_channel();
        self.subscribers
            .lock()
            .entry(symbol.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// 写入一次拉取结果
    ///
    /// 价格缺失或不大于 0 视为失败，保留旧值并标记 Degraded。返回是否写入
    pub fn apply(&self, symbol: &str, quote: Quote) -> bool {
        if !quote.has_valid_price() {
            self.mark_failure(symbol, ConnectionStatus::Degraded, "upstream returned no valid price");
            return false;
        }

        {
            let mut entries = self.entries.write();
            entries.insert(
                symbol.to_string(),
                CachedQuote {
                    symbol: symbol.to_string(),
                    quote: Some(quote.clone()),
                    status: ConnectionStatus::Live,
                    updated_at: Some(Utc::now()),
                    last_error: None,
                },
            );
        }

        self.notify(symbol, &quote);
        true
    }

    /// 记录拉取失败，不清除已有报价
    pub fn mark_failure(&self, symbol: &str, status: ConnectionStatus, reason: &str) {
        let mut entries = self.entries.write();
        let entry = entries.entry(symbol.to_string()).or_insert_with(|| CachedQuote {
            symbol: symbol.to_string(),
            quote: None,
            status,
            updated_at: None,
            last_error: None,
        });
        entry.status = status;
        entry.last_error = Some(reason.to_string());
    }

    pub fn get(&self, symbol: &str) -> Option<CachedQuote> {
        self.entries.read().get(symbol).cloned()
    }

    /// 最后已知价格（不论当前连接状态）
    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.entries
            .read()
            .get(symbol)
            .and_then(|e| e.quote.as_ref())
            .and_then(|q| q.price)
    }

    /// 全部条目，按代码排序
    pub fn snapshot(&self) -> Vec<CachedQuote> {
        let mut all: Vec<CachedQuote> = self.entries.read().values().cloned().collect();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        all
    }

    /// 推送给该代码的所有订阅者，顺带清理已关闭的订阅
    fn notify(&self, symbol: &str, quote: &Quote) {
        let mut subscribers = self.subscribers.lock();
        if let Some(senders) = subscribers.get_mut(symbol) {
            senders.retain(|tx| tx.send(quote.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(symbol);
            }
        }
    }
}
