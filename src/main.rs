//! 行情看板后端服务
//!
//! 代理 EODHD、Marketaux、Polygon、OpenAI 等数据源，统一输出格式，
//! 并提供进程内价格提醒和自选股报价缓存

mod config;     // 配置加载
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod state;      // 共享服务

#[cfg(test)]
mod test_support;

use actix_web::{middleware::Logger, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::Cors;
use crate::models::set_response_timezone;
use crate::services::feed::QuoteSource;
use crate::state::AppServices;

/// 应用程序入口
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, load_message) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    log::info!("{}", load_message);

    if let Err(e) = set_response_timezone(&config.server.timezone) {
        log::warn!("{}，响应时间使用 UTC", e);
    }
    error::set_production(config.is_production());

    let shared = AppServices::new(&config.providers);

    if config.poller.enabled && !config.poller.watchlist.is_empty() {
        let source: Arc<dyn QuoteSource> = shared.eodhd.clone();
        services::watchlist::spawn(
            &config.poller,
            source,
            shared.quotes.clone(),
            shared.alerts.clone(),
            shared.watchlist.clone(),
        );
    } else {
        log::info!("自选股轮询未启用");
    }

    let bind_addr = config.bind_addr();
    log::info!("启动行情看板后端服务，监听 {} ({})", bind_addr, config.server.environment);

    let mut server = HttpServer::new(move || {
        let shared = shared.clone();
        App::new()
            .wrap(Logger::default()) // 请求日志
            .wrap(Cors)              // CORS 与预检
            .configure(|cfg| shared.configure(cfg))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
