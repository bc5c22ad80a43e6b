//! 共享服务
//!
//! 启动时构造一次，由每个 worker 的 App 通过 `web::Data` 共享同一份实例

use actix_web::web;
use std::sync::Arc;

use crate::config::ProvidersConfig;
use crate::handlers;
use crate::services::alert_store::AlertStore;
use crate::services::eodhd::EodhdService;
use crate::services::feed::QuoteCache;
use crate::services::marketaux::MarketauxService;
use crate::services::openai::OpenAiService;
use crate::services::polygon::PolygonService;
use crate::services::watchlist::WatchlistControl;

#[derive(Clone)]
pub struct AppServices {
    pub eodhd: Arc<EodhdService>,
    pub marketaux: Arc<MarketauxService>,
    pub polygon: Arc<PolygonService>,
    pub openai: Arc<OpenAiService>,
    pub alerts: Arc<AlertStore>,
    /// 自选股报价缓存，由轮询任务写入
    pub quotes: Arc<QuoteCache>,
    pub watchlist: Arc<WatchlistControl>,
}

impl AppServices {
    pub fn new(providers: &ProvidersConfig) -> Self {
        Self {
            eodhd: Arc::new(EodhdService::new(&providers.eodhd)),
            marketaux: Arc::new(MarketauxService::new(&providers.marketaux)),
            polygon: Arc::new(PolygonService::new(&providers.polygon)),
            openai: Arc::new(OpenAiService::new(&providers.openai)),
            alerts: Arc::new(AlertStore::new()),
            quotes: Arc::new(QuoteCache::new()),
            watchlist: Arc::new(WatchlistControl::new()),
        }
    }

    /// 注册共享数据和全部路由
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.eodhd.clone()))
            .app_data(web::Data::from(self.marketaux.clone()))
            .app_data(web::Data::from(self.polygon.clone()))
            .app_data(web::Data::from(self.openai.clone()))
            .app_data(web::Data::from(self.alerts.clone()))
            .app_data(web::Data::from(self.quotes.clone()))
            .app_data(web::Data::from(self.watchlist.clone()));
        handlers::config(cfg);
    }
}
