//! 通用 API 响应模型
//!
//! 定义两种响应格式：
//! - `{ ok, items }`：EODHD 系列行情接口
//! - `{ success, data, message, timestamp }`：提醒、自选股等旧版接口

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static RESPONSE_TZ: OnceLock<Tz> = OnceLock::new();

/// 设置响应时间戳使用的时区，只在启动时生效一次
pub fn set_response_timezone(name: &str) -> Result<(), String> {
    let tz: Tz = name.parse().map_err(|e| format!("无效时区 {}: {}", name, e))?;
    let _ = RESPONSE_TZ.set(tz);
    Ok(())
}

/// 当前时间（配置时区，默认 UTC），RFC 3339 格式
pub fn now_rfc3339() -> String {
    let tz = RESPONSE_TZ.get().copied().unwrap_or(Tz::UTC);
    Utc::now().with_timezone(&tz).to_rfc3339()
}

/// 旧版统一响应结构
///
/// 所有旧版接口返回统一格式，包含：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 请求是否成功
    pub success: bool,
    /// 响应数据
    pub data: Option<T>,
    /// 响应消息
    pub message: String,
    /// 响应时间戳（ISO 8601 格式）
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: now_rfc3339(),
        }
    }
}

/// 行情类接口的成功响应 `{ ok: true, items: [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub ok: bool,
    pub items: Vec<T>,
}

impl<T> ItemsResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { ok: true, items }
    }
}
