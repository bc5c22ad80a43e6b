//! 自选股后台轮询任务
//!
//! 按配置的间隔刷新报价缓存。另有一路订阅缓存的报价推送，每写入一条有效报价就检查价格提醒。
//! batched 模式逐个代码分批拉取；snapshot 模式每轮一次批量请求，新一轮会中止上一轮。

use futures::stream::{self, select_all, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::{PollerConfig, PollerMode};
use crate::handlers::params::parse_symbol;
use crate::services::alert_store::AlertStore;
use crate::services::feed::{BatchPoller, QuoteCache, QuoteSource, SnapshotOutcome, SnapshotPoller};

/// 轮询暂停开关，由接口层控制
///
/// snapshot 模式下暂停会立即中止在途的批量请求
#[derive(Default)]
pub struct WatchlistControl {
    paused: AtomicBool,
    snapshot: Mutex<Option<Arc<SnapshotPoller>>>,
}

impl WatchlistControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        if let Some(poller) = self.snapshot.lock().as_ref() {
            poller.hide();
        }
        log::info!("自选股轮询已暂停");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        if let Some(poller) = self.snapshot.lock().as_ref() {
            poller.show();
        }
        log::info!("自选股轮询已恢复");
    }

    fn attach(&self, poller: Arc<SnapshotPoller>) {
        let mut slot = self.snapshot.lock();
        if self.is_paused() {
            poller.hide();
        }
        *slot = Some(poller);
    }
}

/// 整理配置中的自选股代码：去空白、转大写、去重，非法代码跳过
pub fn normalize_watchlist(entries: &[String]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_symbol("watchlist", Some(entry)) {
            Ok(symbol) => {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
            Err(e) => log::warn!("忽略自选股代码 {:?}: {}", entry, e),
        }
    }
    symbols
}

/// 检查提醒并记录触发结果
fn check_alerts(alerts: &AlertStore, cache: &QuoteCache) {
    let triggered = alerts.evaluate(cache);
    if !triggered.is_empty() {
        log::info!("触发 {} 条价格提醒", triggered.len());
    }
}

/// 启动轮询任务
///
/// 订阅在返回前完成，轮询写入的第一条报价也会参与提醒检查
pub fn spawn(
    config: &PollerConfig,
    source: Arc<dyn QuoteSource>,
    cache: Arc<QuoteCache>,
    alerts: Arc<AlertStore>,
    control: Arc<WatchlistControl>,
) -> JoinHandle<()> {
    let symbols = normalize_watchlist(&config.watchlist);
    let period = config.interval();
    log::info!(
        "启动自选股轮询: {:?} 模式，{} 个代码，间隔 {:?}",
        config.mode,
        symbols.len(),
        period
    );

    let mut updates = select_all(symbols.iter().map(|symbol| {
        let rx = cache.subscribe(symbol);
        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|quote| (quote, rx))
        }))
    }));
    let watch = {
        let cache = cache.clone();
        async move {
            while let Some(quote) = updates.next().await {
                log::trace!("{} 报价更新: {:?}", quote.symbol, quote.price);
                check_alerts(&alerts, &cache);
            }
        }
    };

    match config.mode {
        PollerMode::Batched => {
            let poller = BatchPoller::new(source, cache, config.batch_size, config.inter_batch_delay());
            let poll = async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if control.is_paused() {
                        continue;
                    }
                    let report = poller.run_cycle(&symbols).await;
                    if report.failed > 0 {
                        log::info!("自选股轮询: 成功 {} 失败 {}", report.fetched, report.failed);
                    }
                }
            };
            tokio::spawn(async move {
                tokio::join!(poll, watch);
            })
        }
        PollerMode::Snapshot => {
            let poller = Arc::new(SnapshotPoller::new(source, cache, symbols));
            control.attach(poller.clone());
            let poll = async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    // 独立任务执行，下一轮到来时可以中止本轮
                    let poller = poller.clone();
                    tokio::spawn(async move {
                        match poller.poll_once().await {
                            SnapshotOutcome::Applied(count) => log::debug!("快照写入 {} 个代码", count),
                            outcome => log::debug!("快照轮询结果: {:?}", outcome),
                        }
                    });
                }
            };
            tokio::spawn(async move {
                tokio::join!(poll, watch);
            })
        }
    }
}
