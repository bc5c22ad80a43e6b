//! 批量快照轮询
//!
//! 每轮只发一次批量请求。每轮分配一个递增代号，新一轮开始时中止上一轮的在途请求；
//! 结果写入前再核对代号，过期结果一律丢弃。暂停（hide）时中止在途请求，恢复（show）后继续。

use futures::future::{abortable, AbortHandle, Aborted};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::cache::{ConnectionStatus, QuoteCache};
use super::QuoteSource;

/// 一轮快照的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// 写入缓存的代码数
    Applied(usize),
    Failed,
    /// 被新一轮或暂停中止
    Cancelled,
    /// 返回时已有更新的一轮，结果被丢弃
    Stale,
    Paused,
}

pub struct SnapshotPoller {
    source: Arc<dyn QuoteSource>,
    cache: Arc<QuoteCache>,
    symbols: Vec<String>,
    generation: AtomicU64,
    active: Mutex<Option<(u64, AbortHandle)>>,
    visible: AtomicBool,
}

impl SnapshotPoller {
    pub fn new(source: Arc<dyn QuoteSource>, cache: Arc<QuoteCache>, symbols: Vec<String>) -> Self {
        Self {
            source,
            cache,
            symbols,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
            visible: AtomicBool::new(true),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// 执行一轮快照
    pub async fn poll_once(&self) -> SnapshotOutcome {
        if !self.is_visible() {
            return SnapshotOutcome::Paused;
        }

        let (fetch, handle) = abortable(self.source.fetch_batch(&self.symbols));

        // 分配代号和登记在途请求必须在同一把锁内完成
        let generation = {
            let mut active = self.active.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((previous_generation, previous_handle)) = active.replace((generation, handle)) {
                log::debug!("中止第 {} 轮快照请求", previous_generation);
                previous_handle.abort();
            }
            generation
        };

        let result = fetch.await;

        // 核对代号到写入缓存期间持有锁，新一轮无法在中间插入
        let mut active = self.active.lock();
        if matches!(*active, Some((g, _)) if g == generation) {
            *active = None;
        }

        let result = match result {
            Err(Aborted) => return SnapshotOutcome::Cancelled,
            Ok(result) => result,
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("丢弃第 {} 轮过期快照", generation);
            return SnapshotOutcome::Stale;
        }

        match result {
            Ok(quotes) => {
                let applied = quotes
                    .into_iter()
                    .filter(|q| !q.symbol.is_empty())
                    .map(|q| {
                        let symbol = q.symbol.clone();
                        self.cache.apply(&symbol, q)
                    })
                    .filter(|applied| *applied)
                    .count();
                SnapshotOutcome::Applied(applied)
            }
            Err(e) => {
                log::warn!("批量快照失败: {}", e);
                let status = ConnectionStatus::from_error(&e);
                let reason = e.to_string();
                for symbol in &self.symbols {
                    self.cache.mark_failure(symbol, status, &reason);
                }
                SnapshotOutcome::Failed
            }
        }
    }

    /// 暂停轮询并中止在途请求
    pub fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        let mut active = self.active.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((_, handle)) = active.take() {
            handle.abort();
        }
    }

    /// 恢复轮询
    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::feed::mock::ScriptedSource;
    use std::time::Duration;

    fn poller(source: Arc<ScriptedSource>) -> Arc<SnapshotPoller> {
        Arc::new(SnapshotPoller::new(
            source,
            Arc::new(QuoteCache::new()),
            vec!["AAPL.US".to_string(), "MSFT.US".to_string()],
        ))
    }

    #[tokio::test]
    async fn test_poll_applies_quotes() {
        let source = Arc::new(ScriptedSource::default());
        source.batch_script.lock().push((Duration::ZERO, 10.0));
        let poller = poller(source);

        assert_eq!(poller.poll_once().await, SnapshotOutcome::Applied(2));
        assert_eq!(poller.cache.last_price("MSFT.US"), Some(10.0));
    }

    #[tokio::test]
    async fn test_new_cycle_cancels_previous() {
        let source = Arc::new(ScriptedSource::default());
        {
            let mut script = source.batch_script.lock();
            script.push((Duration::from_millis(300), 1.0));
            script.push((Duration::from_millis(10), 2.0));
        }
        let poller = poller(source);

        let slow = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_once().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = poller.poll_once().await;
        let slow = slow.await.unwrap();

        assert_eq!(fast, SnapshotOutcome::Applied(2));
        assert_eq!(slow, SnapshotOutcome::Cancelled);
        assert_eq!(poller.cache.last_price("AAPL.US"), Some(2.0));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(poller.cache.last_price("AAPL.US"), Some(2.0));
    }

    #[tokio::test]
    async fn test_hide_aborts_and_pauses() {
        let source = Arc::new(ScriptedSource::default());
        source.batch_script.lock().push((Duration::from_millis(300), 1.0));
        let poller = poller(source.clone());

        let in_flight = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_once().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        poller.hide();
        assert_eq!(in_flight.await.unwrap(), SnapshotOutcome::Cancelled);
        assert_eq!(poller.poll_once().await, SnapshotOutcome::Paused);
        assert!(poller.cache.get("AAPL.US").is_none());

        poller.show();
        source.batch_script.lock().push((Duration::ZERO, 3.0));
        assert_eq!(poller.poll_once().await, SnapshotOutcome::Applied(2));
        assert_eq!(poller.cache.last_price("AAPL.US"), Some(3.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cycles_apply_exactly_once() {
        let source = Arc::new(ScriptedSource::default());
        {
            let mut script = source.batch_script.lock();
            for i in 0..8 {
                script.push((Duration::from_millis(50), i as f64 + 1.0));
            }
        }
        let poller = poller(source);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let poller = poller.clone();
                tokio::spawn(async move { poller.poll_once().await })
            })
            .collect();

        let mut applied = 0;
        for task in tasks {
            match task.await.unwrap() {
                SnapshotOutcome::Applied(n) => {
                    assert_eq!(n, 2);
                    applied += 1;
                }
                SnapshotOutcome::Cancelled | SnapshotOutcome::Stale => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        assert_eq!(applied, 1);
        assert!(poller.active.lock().is_none());
        assert!(poller.cache.last_price("AAPL.US").is_some());
    }
}
