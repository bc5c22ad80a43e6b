//! AI 对话数据模型

use serde::{Deserialize, Serialize};

/// 单条对话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// system / user / assistant
    pub role: String,
    pub content: String,
}

/// 对话请求体
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// 不指定时使用默认模型
    pub model: Option<String>,
    pub temperature: Option<f64>,
}

/// 对话结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}
