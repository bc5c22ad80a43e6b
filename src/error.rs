//! 错误类型
//!
//! - `UpstreamError`：上游数据源调用失败的分类
//! - `AppError`：接口层错误，决定 HTTP 状态码和错误响应格式

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static EXPOSE_INTERNAL_DETAIL: AtomicBool = AtomicBool::new(true);

/// 生产环境下隐藏内部错误详情
pub fn set_production(production: bool) {
    EXPOSE_INTERNAL_DETAIL.store(!production, Ordering::Relaxed);
}

/// 上游调用错误
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// 环境变量中没有 API Key
    #[error("missing API key: environment variable {0} is not set")]
    MissingKey(String),

    /// 超过固定超时时间被中止
    #[error("{provider} request timed out after {after_ms} ms")]
    Timeout { provider: &'static str, after_ms: u64 },

    /// 连接失败等网络错误
    #[error("{provider} network error: {message}")]
    Network { provider: &'static str, message: String },

    /// 非 2xx 响应，保留响应体用于诊断
    #[error("{provider} responded with HTTP {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },

    /// 响应体不是合法 JSON
    #[error("{provider} returned an unreadable body: {message}")]
    Decode { provider: &'static str, message: String },
}

impl UpstreamError {
    /// 是否为限流响应（HTTP 429）
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 429, .. })
    }

    /// 是否为连接层面的失败（网络错误或超时）
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, UpstreamError::Network { .. } | UpstreamError::Timeout { .. })
    }
}

/// 接口层错误
#[derive(Debug, Error)]
pub enum AppError {
    /// 缺少或非法的请求参数
    #[error("{0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    NotFound(String),

    /// 上游返回失败
    #[error("{0}")]
    Upstream(String),

    /// 上游超时
    #[error("{0}")]
    Timeout(String),

    /// 缺少 API Key 等配置
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// 错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 对外可见的错误详情
    fn detail(&self) -> Option<String> {
        match self {
            AppError::MethodNotAllowed => None,
            AppError::Internal(_) if !EXPOSE_INTERNAL_DETAIL.load(Ordering::Relaxed) => None,
            other => Some(other.to_string()),
        }
    }

    /// `{ ok: false, code, detail }` 错误体
    fn envelope(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("ok".to_string(), Value::Bool(false));
        body.insert("code".to_string(), Value::String(self.code().to_string()));
        if let Some(detail) = self.detail() {
            body.insert("detail".to_string(), Value::String(detail));
        }
        body
    }

    /// 列表类接口的错误响应，附带空数组，前端可直接渲染"无数据"
    pub fn list_response(&self, list_field: &str) -> HttpResponse {
        let mut body = self.envelope();
        body.insert(list_field.to_string(), Value::Array(Vec::new()));
        HttpResponse::build(self.status_code()).json(Value::Object(body))
    }

    /// 旧版接口的错误响应 `{ error }`
    pub fn legacy_response(&self) -> HttpResponse {
        let message = self.detail().unwrap_or_else(|| match self {
            AppError::MethodNotAllowed => "Method not allowed".to_string(),
            _ => "Internal server error".to_string(),
        });
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Timeout(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(Value::Object(self.envelope()))
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingKey(_) => AppError::Configuration(err.to_string()),
            UpstreamError::Timeout { .. } => AppError::Timeout(err.to_string()),
            UpstreamError::Network { .. }
            | UpstreamError::Status { .. }
            | UpstreamError::Decode { .. } => AppError::Upstream(err.to_string()),
        }
    }
}
