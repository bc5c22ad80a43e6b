//! HTTP 请求处理器
//!
//! ## API 列表（前缀 /api）
//! - GET /health - 健康检查
//! - GET /quotes?symbols= - EODHD 实时报价
//! - GET /prices?symbol=&from=&to= - EODHD 日线
//! - GET /calendar?from=&to= - EODHD 经济日历
//! - GET /news?symbols=&tags= - EODHD 新闻
//! - GET /marketaux/news?symbols= - Marketaux 新闻
//! - GET /polygon/snapshot?tickers= - Polygon 快照
//! - POST /chat - OpenAI 对话
//! - GET/POST/PUT/DELETE /alerts - 价格提醒
//! - POST /alerts/check - 立即检查提醒
//! - GET /watchlist - 自选股缓存报价

pub mod alerts;
pub mod calendar;
pub mod chat;
pub mod health;
pub mod market;
pub mod news;
pub mod params;
pub mod watchlist;

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::models::ItemsResponse;

/// 列表类接口统一输出：成功 `{ ok, items }`，失败附带空的 list_field 数组
pub fn respond_list<T: Serialize>(result: Result<Vec<T>, AppError>, list_field: &str) -> HttpResponse {
    let encoded = result.and_then(|items| {
        serde_json::to_value(ItemsResponse::new(items))
            .map_err(|e| AppError::Internal(format!("failed to encode response: {}", e)))
    });
    match encoded {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => e.list_response(list_field),
    }
}

/// 各列表接口出错时附带的空数组字段名
fn list_field_for(path: &str) -> Option<&'static str> {
    match path.trim_end_matches('/') {
        "/api/quotes" => Some("items"),
        "/api/prices" | "/api/polygon/snapshot" => Some("prices"),
        "/api/calendar" => Some("events"),
        "/api/news" | "/api/marketaux/news" => Some("articles"),
        _ => None,
    }
}

/// 查询参数反序列化失败时按接口类型输出对应格式的 400
fn query_error(err: actix_web::error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let app_error = AppError::Validation(err.to_string());
    let response = if let Some(field) = list_field_for(req.path()) {
        app_error.list_response(field)
    } else if req.path().starts_with("/api/alerts") {
        app_error.legacy_response()
    } else {
        return app_error.into();
    };
    InternalError::from_response(err, response).into()
}

/// 不支持的请求方法
pub async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

async fn route_not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Route not found".to_string()))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
    .service(
        web::scope("/api")
            .configure(health::config)
            .configure(market::config)
            .configure(calendar::config)
            .configure(news::config)
            .configure(chat::config)
            .configure(alerts::config)
            .configure(watchlist::config)
            .default_service(web::to(route_not_found)),
    );
}
