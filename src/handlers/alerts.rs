//! 价格提醒接口处理器
//!
//! - GET /alerts?userId=u1 - 提醒列表；带 id 时查询单条
//! - POST /alerts - 创建提醒
//! - PUT /alerts?id=1 - 更新提醒（浅合并）
//! - DELETE /alerts?id=1 - 删除提醒
//! - POST /alerts/check - 用自选股缓存立即检查价格提醒
//!
//! 错误响应格式为 `{ error }`

use actix_web::{web, HttpResponse, Result};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::{AlertPatch, AlertQuery, ApiResponse, NewAlert};
use crate::services::alert_store::AlertStore;
use crate::services::feed::QuoteCache;

fn parse_id(raw: Option<&str>) -> Result<u64, AppError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::Validation("Missing required parameter: id".to_string()));
    }
    raw.parse::<u64>()
        .map_err(|_| AppError::Validation(format!("Invalid alert id: {}", raw)))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))
}

fn not_found() -> AppError {
    AppError::NotFound("Alert not found".to_string())
}

fn legacy(result: Result<HttpResponse, AppError>) -> HttpResponse {
    result.unwrap_or_else(|e| e.legacy_response())
}

fn find_alerts(store: &AlertStore, query: &AlertQuery) -> Result<HttpResponse, AppError> {
    if query.id.is_some() {
        let id = parse_id(query.id.as_deref())?;
        let alert = store.get(id).ok_or_else(not_found)?;
        return Ok(HttpResponse::Ok().json(ApiResponse::success(alert)));
    }
    let alerts = store.list(query.user_id.as_deref());
    Ok(HttpResponse::Ok().json(ApiResponse::success(alerts)))
}

/// 查询提醒
pub async fn list_alerts(store: web::Data<AlertStore>, query: web::Query<AlertQuery>) -> Result<HttpResponse> {
    Ok(legacy(find_alerts(&store, &query)))
}

/// 创建提醒
pub async fn create_alert(store: web::Data<AlertStore>, body: web::Bytes) -> Result<HttpResponse> {
    let result = parse_body::<NewAlert>(&body)
        .and_then(|input| store.create(input))
        .map(|alert| HttpResponse::Created().json(ApiResponse::success(alert)));

    Ok(legacy(result))
}

/// 更新提醒
pub async fn update_alert(
    store: web::Data<AlertStore>,
    query: web::Query<AlertQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let result = parse_id(query.id.as_deref()).and_then(|id| {
        // 空请求体视为空补丁
        let patch = if body.iter().all(u8::is_ascii_whitespace) {
            AlertPatch::default()
        } else {
            parse_body::<AlertPatch>(&body)?
        };
        let alert = store.update(id, patch).ok_or_else(not_found)?;
        log::info!("更新提醒 #{}", id);
        Ok(HttpResponse::Ok().json(ApiResponse::success(alert)))
    });

    Ok(legacy(result))
}

/// 删除提醒
pub async fn delete_alert(store: web::Data<AlertStore>, query: web::Query<AlertQuery>) -> Result<HttpResponse> {
    let result = parse_id(query.id.as_deref()).and_then(|id| {
        let alert = store.delete(id).ok_or_else(not_found)?;
        log::info!("删除提醒 #{}", id);
        Ok(HttpResponse::Ok().json(ApiResponse::success(alert)))
    });

    Ok(legacy(result))
}

/// 用缓存中的最后已知价格检查价格提醒，返回本次触发的提醒
pub async fn check_alerts(store: web::Data<AlertStore>, cache: web::Data<QuoteCache>) -> Result<HttpResponse> {
    let triggered = store.evaluate(&cache);
    Ok(HttpResponse::Ok().json(ApiResponse::success(triggered)))
}

async fn alerts_method_not_allowed() -> HttpResponse {
    AppError::MethodNotAllowed.legacy_response()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/alerts")
            .route(web::get().to(list_alerts))
            .route(web::post().to(create_alert))
            .route(web::put().to(update_alert))
            .route(web::delete().to(delete_alert))
            .default_service(web::to(alerts_method_not_allowed)),
    )
    .service(
        web::resource("/alerts/check")
            .route(web::post().to(check_alerts))
            .default_service(web::to(alerts_method_not_allowed)),
    );
}
