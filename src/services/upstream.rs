//! 上游数据源客户端
//!
//! 对单个外部数据源发起带认证的请求：
//! - 每次请求时从环境变量读取 API Key，缺失时返回 MissingKey 而不是崩溃
//! - 固定超时，超时错误与普通网络错误区分
//! - 非 2xx 响应保留响应体文本用于诊断
//! - 不做重试

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::env;
use std::time::Duration;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::UpstreamError;

/// 错误响应体保留的最大字符数
const MAX_ERROR_BODY_CHARS: usize = 500;

/// API Key 的传递方式
#[derive(Debug, Clone, Copy)]
pub enum Auth {
    /// 作为查询参数，如 `api_token=<key>`
    QueryParam(&'static str),
    /// `Authorization: Bearer <key>`
    Bearer,
}

/// 单个数据源的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    provider: &'static str,
    base_url: String,
    key_env: String,
    auth: Auth,
    /// 每个请求都附带的固定参数，如 EODHD 的 `fmt=json`
    fixed_params: Vec<(&'static str, &'static str)>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(provider: &'static str, config: &ProviderConfig, auth: Auth) -> Self {
        Self {
            http: Client::new(),
            provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_env: config.api_key_env.clone(),
            auth,
            fixed_params: Vec::new(),
            timeout: config.timeout(),
        }
    }

    /// 追加每个请求都携带的固定查询参数
    pub fn with_param(mut self, key: &'static str, value: &'static str) -> Self {
        self.fixed_params.push((key, value));
        self
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// 请求时读取 API Key
    fn api_key(&self) -> Result<String, UpstreamError> {
        env::var(&self.key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| UpstreamError::MissingKey(self.key_env.clone()))
    }

    fn build_url(&self, path: &str, query: &[(&str, String)], key: &str) -> Result<Url, UpstreamError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| UpstreamError::Network {
            provider: self.provider,
            message: format!("invalid URL {}: {}", raw, e),
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            for (k, v) in &self.fixed_params {
                pairs.append_pair(k, v);
            }
            if let Auth::QueryParam(name) = self.auth {
                pairs.append_pair(name, key);
            }
        }

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder, key: &str) -> RequestBuilder {
        match self.auth {
            Auth::Bearer => request.bearer_auth(key),
            Auth::QueryParam(_) => request,
        }
    }

    /// GET 请求，返回解析后的 JSON
    pub async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let key = self.api_key()?;
        let url = self.build_url(path, query, &key)?;
        log::debug!("📡 {} GET {}", self.provider, url.path());

        let request = self.authorize(self.http.get(url), &key);
        self.execute(request).await
    }

    /// POST JSON 请求体，返回解析后的 JSON
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        let key = self.api_key()?;
        let url = self.build_url(path, &[], &key)?;
        log::debug!("📡 {} POST {}", self.provider, url.path());

        let request = self.authorize(self.http.post(url), &key).json(body);
        self.execute(request).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = match tokio::time::timeout(self.timeout, exchange).await {
            Err(_) => return Err(self.timeout_error()),
            Ok(Err(e)) if e.is_timeout() => return Err(self.timeout_error()),
            Ok(Err(e)) => {
                log::warn!("{} 请求失败: {}", self.provider, e);
                return Err(UpstreamError::Network {
                    provider: self.provider,
                    message: e.to_string(),
                });
            }
            Ok(Ok(pair)) => pair,
        };

        if !status.is_success() {
            log::warn!("{} 返回 HTTP {}", self.provider, status.as_u16());
            return Err(UpstreamError::Status {
                provider: self.provider,
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError::Decode {
            provider: self.provider,
            message: e.to_string(),
        })
    }

    fn timeout_error(&self) -> UpstreamError {
        log::warn!("{} 请求超时 ({} ms)", self.provider, self.timeout.as_millis());
        UpstreamError::Timeout {
            provider: self.provider,
            after_ms: self.timeout.as_millis() as u64,
        }
    }
}
