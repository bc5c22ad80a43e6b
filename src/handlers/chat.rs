//! AI 对话接口处理器

use actix_web::{web, HttpResponse, Result};

use super::method_not_allowed;
use crate::error::AppError;
use crate::models::{ApiResponse, ChatRequest};
use crate::services::openai::OpenAiService;

/// 转发对话到 OpenAI
///
/// POST /api/chat
/// 请求体：{ "messages": [{ "role": "user", "content": "..." }], "model"?: "...", "temperature"?: 0.7 }
pub async fn post_chat(openai: web::Data<OpenAiService>, body: web::Bytes) -> Result<HttpResponse> {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return Ok(AppError::Validation(format!("Invalid JSON body: {}", e)).legacy_response()),
    };
    if request.messages.is_empty() {
        return Ok(AppError::Validation("Missing required fields: messages".to_string()).legacy_response());
    }

    match openai
        .chat(&request.messages, request.model.as_deref(), request.temperature)
        .await
    {
        Ok(reply) => Ok(HttpResponse::Ok().json(ApiResponse::success(reply))),
        Err(e) => {
            log::warn!("对话请求失败: {}", e);
            Ok(AppError::from(e).legacy_response())
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/chat")
            .route(web::post().to(post_chat))
            .default_service(web::to(method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::services;
    use crate::test_support::{spawn_responder, TEST_KEY_ENV};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_chat_returns_first_choice() {
        let upstream = spawn_responder(
            200,
            r#"{"model":"gpt-4o-mini-2024-07-18","choices":[{"message":{"role":"assistant","content":"Rates are flat."}}]}"#,
        )
        .await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "messages": [{ "role": "user", "content": "What did the Fed do?" }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["reply"], "Rates are flat.");
        assert_eq!(body["data"]["model"], "gpt-4o-mini-2024-07-18");

        let request = upstream.last_request();
        assert!(request.starts_with("POST /chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer test-key"));
    }

    #[actix_web::test]
    async fn test_chat_rejects_empty_messages() {
        let upstream = spawn_responder(200, "{}").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "messages": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Missing required fields: messages" }));

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .insert_header(("content-type", "application/json"))
            .set_payload("not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(upstream.request_count(), 0);
    }

    #[actix_web::test]
    async fn test_chat_get_is_not_allowed() {
        let upstream = spawn_responder(200, "{}").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/api/chat").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 405);
    }
}
