//! 分批轮询
//!
//! 自选股按固定大小分批，批内并发拉取，整批完成后等待固定延迟再开始下一批，
//! 避免触发上游限流。同一代码已有在途请求时跳过。

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::cache::{ConnectionStatus, QuoteCache};
use super::QuoteSource;

/// 一轮轮询的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 写入缓存的代码数
    pub fetched: usize,
    /// 因已有在途请求而跳过的代码数
    pub skipped: usize,
    pub failed: usize,
}

/// 在途标记，离开作用域（包括被取消）时释放
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    symbol: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.symbol);
    }
}

pub struct BatchPoller {
    source: Arc<dyn QuoteSource>,
    cache: Arc<QuoteCache>,
    in_flight: Mutex<HashSet<String>>,
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchPoller {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        cache: Arc<QuoteCache>,
        batch_size: usize,
        inter_batch_delay: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            in_flight: Mutex::new(HashSet::new()),
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    /// 占用在途标记，已被占用时返回 None
    fn claim(&self, symbol: &str) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock();
        if !set.insert(symbol.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            symbol: symbol.to_string(),
        })
    }

    /// 执行一轮完整轮询
    pub async fn run_cycle(&self, symbols: &[String]) -> CycleReport {
        let mut report = CycleReport::default();

        for (index, batch) in symbols.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }

            let mut claimed = Vec::with_capacity(batch.len());
            for symbol in batch {
                match self.claim(symbol) {
                    Some(guard) => claimed.push(guard),
                    None => {
                        log::debug!("{} 已有在途请求，跳过", symbol);
                        report.skipped += 1;
                    }
                }
            }

            let results = join_all(claimed.into_iter().map(|guard| async move {
                let result = self.source.fetch_quote(&guard.symbol).await;
                (guard, result)
            }))
            .await;

            for (guard, result) in results {
                match result {
                    Ok(quote) => {
                        if self.cache.apply(&guard.symbol, quote) {
                            report.fetched += 1;
                        } else {
                            report.failed += 1;
                        }
                    }
                    Err(e) => {
                        if e.is_rate_limited() {
                            log::warn!("拉取 {} 报价被限流: {}", guard.symbol, e);
                        } else {
                            log::warn!("拉取 {} 报价失败: {}", guard.symbol, e);
                        }
                        self.cache
                            .mark_failure(&guard.symbol, ConnectionStatus::from_error(&e), &e.to_string());
                        report.failed += 1;
                    }
                }
            }
        }

        log::debug!(
            "轮询完成: 成功 {} 跳过 {} 失败 {}",
            report.fetched,
            report.skipped,
            report.failed
        );
        report
    }
}
