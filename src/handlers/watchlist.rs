//! 自选股接口处理器
//!
//! - GET /watchlist - 全部缓存报价，`?symbol=` 只取一个
//! - POST /watchlist/pause - 暂停后台轮询
//! - POST /watchlist/resume - 恢复后台轮询

use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use super::method_not_allowed;
use super::params::parse_symbol;
use crate::error::AppError;
use crate::models::{ApiResponse, WatchlistQuery};
use crate::services::feed::QuoteCache;
use crate::services::watchlist::WatchlistControl;

/// 自选股缓存报价及连接状态
///
/// GET /api/watchlist
pub async fn get_watchlist(
    cache: web::Data<QuoteCache>,
    query: web::Query<WatchlistQuery>,
) -> Result<HttpResponse, AppError> {
    match query.symbol.as_deref() {
        None => Ok(HttpResponse::Ok().json(ApiResponse::success(cache.snapshot()))),
        Some(raw) => {
            let symbol = parse_symbol("symbol", Some(raw))?;
            let entry = cache
                .get(&symbol)
                .ok_or_else(|| AppError::NotFound(format!("{} is not in the watchlist cache", symbol)))?;
            Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
        }
    }
}

pub async fn pause_watchlist(control: web::Data<WatchlistControl>) -> HttpResponse {
    control.pause();
    HttpResponse::Ok().json(ApiResponse::success(json!({ "paused": control.is_paused() })))
}

pub async fn resume_watchlist(control: web::Data<WatchlistControl>) -> HttpResponse {
    control.resume();
    HttpResponse::Ok().json(ApiResponse::success(json!({ "paused": control.is_paused() })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/watchlist")
            .route(web::get().to(get_watchlist))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/watchlist/pause")
            .route(web::post().to(pause_watchlist))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/watchlist/resume")
            .route(web::post().to(resume_watchlist))
            .default_service(web::to(method_not_allowed)),
    );
}
