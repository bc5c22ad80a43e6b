//! OpenAI 对话代理

use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::error::UpstreamError;
use crate::models::{ChatMessage, ChatReply};
use crate::services::upstream::{Auth, UpstreamClient};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiService {
    client: UpstreamClient,
}

impl OpenAiService {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: UpstreamClient::new("OpenAI", config, Auth::Bearer),
        }
    }

    /// 调用 chat completions，返回第一条候选回复
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        temperature: Option<f64>,
    ) -> Result<ChatReply, UpstreamError> {
        let model = model.unwrap_or(DEFAULT_CHAT_MODEL);
        let mut body = json!({ "model": model, "messages": messages });
        if let Some(t) = temperature {
            body["temperature"] = json!(t);
        }

        let raw = self.client.post_json("/chat/completions", &body).await?;
        parse_reply(&raw, model).ok_or_else(|| UpstreamError::Decode {
            provider: self.client.provider(),
            message: "response has no choices[0].message.content".to_string(),
        })
    }
}

fn parse_reply(raw: &Value, requested_model: &str) -> Option<ChatReply> {
    let reply = raw.pointer("/choices/0/message/content")?.as_str()?.to_string();
    let model = raw
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(requested_model)
        .to_string();
    Some(ChatReply { reply, model })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{provider_config, spawn_responder, TEST_KEY_ENV};

    #[test]
    fn test_parse_reply() {
        let raw = json!({
            "model": "gpt-4o-mini-2024",
            "choices": [{ "message": { "role": "assistant", "content": "Hello" } }]
        });
        let reply = parse_reply(&raw, DEFAULT_CHAT_MODEL).unwrap();
        assert_eq!(reply.reply, "Hello");
        assert_eq!(reply.model, "gpt-4o-mini-2024");

        assert!(parse_reply(&json!({ "choices": [] }), DEFAULT_CHAT_MODEL).is_none());
    }

    #[tokio::test]
    async fn test_empty_choices_is_decode_error() {
        let server = spawn_responder(200, r#"{"choices":[]}"#).await;
        let service = OpenAiService::new(&provider_config(&server.base_url, TEST_KEY_ENV, 2_000));

        let messages = vec![ChatMessage { role: "user".to_string(), content: "hi".to_string() }];
        let err = service.chat(&messages, None, None).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { provider: "OpenAI", .. }));
    }
}
