//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，所有字段均有默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
    /// 运行环境，production 下不暴露内部错误详情
    #[serde(default = "default_environment")]
    pub environment: String,
    /// 响应时间戳使用的时区（IANA 名称）
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 单个上游数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 接口根地址
    pub base_url: String,
    /// 保存 API Key 的环境变量名（请求时读取）
    pub api_key_env: String,
    /// 请求超时时间（毫秒）
    pub timeout_ms: u64,
}

impl ProviderConfig {
    fn new(base_url: &str, api_key_env: &str, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key_env: api_key_env.to_string(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 上游数据源集合
///
/// 每个数据源可以只覆盖部分字段，未给出的字段沿用该数据源的默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawProviders")]
pub struct ProvidersConfig {
    pub eodhd: ProviderConfig,
    pub marketaux: ProviderConfig,
    pub polygon: ProviderConfig,
    pub openai: ProviderConfig,
}

/// 配置文件中的单个数据源片段
#[derive(Debug, Default, Deserialize)]
struct ProviderOverride {
    base_url: Option<String>,
    api_key_env: Option<String>,
    timeout_ms: Option<u64>,
}

impl ProviderOverride {
    fn over(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.unwrap_or(base.base_url),
            api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
            timeout_ms: self.timeout_ms.unwrap_or(base.timeout_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProviders {
    #[serde(default)]
    eodhd: ProviderOverride,
    #[serde(default)]
    marketaux: ProviderOverride,
    #[serde(default)]
    polygon: ProviderOverride,
    #[serde(default)]
    openai: ProviderOverride,
}

impl From<RawProviders> for ProvidersConfig {
    fn from(raw: RawProviders) -> Self {
        Self {
            eodhd: raw.eodhd.over(default_eodhd()),
            marketaux: raw.marketaux.over(default_marketaux()),
            polygon: raw.polygon.over(default_polygon()),
            openai: raw.openai.over(default_openai()),
        }
    }
}

/// 自选股轮询方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerMode {
    /// 按批逐个拉取，批间延迟
    Batched,
    /// 每轮一次批量接口调用
    Snapshot,
}

/// 自选股轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// 是否启用后台轮询
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_poller_mode")]
    pub mode: PollerMode,
    /// 自选股代码列表
    #[serde(default)]
    pub watchlist: Vec<String>,
    /// 每批代码数量
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 批间延迟（毫秒）
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_ms: u64,
    /// 轮询间隔（秒）
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl PollerConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 上游数据源配置
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// 自选股轮询配置
    #[serde(default)]
    pub poller: PollerConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_environment() -> String { "development".to_string() }
fn default_timezone() -> String { "UTC".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_eodhd() -> ProviderConfig { ProviderConfig::new("https://eodhd.com/api", "EODHD_API_KEY", 10_000) }
fn default_marketaux() -> ProviderConfig { ProviderConfig::new("https://api.marketaux.com/v1", "MARKETAUX_API_KEY", 10_000) }
fn default_polygon() -> ProviderConfig { ProviderConfig::new("https://api.polygon.io", "POLYGON_API_KEY", 3_000) }
fn default_openai() -> ProviderConfig { ProviderConfig::new("https://api.openai.com/v1", "OPENAI_API_KEY", 15_000) }
fn default_poller_mode() -> PollerMode { PollerMode::Batched }
fn default_batch_size() -> usize { 3 }
fn default_inter_batch_delay() -> u64 { 2_000 }
fn default_interval() -> u64 { 15 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            environment: default_environment(),
            timezone: default_timezone(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            eodhd: default_eodhd(),
            marketaux: default_marketaux(),
            polygon: default_polygon(),
            openai: default_openai(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: default_poller_mode(),
            watchlist: Vec::new(),
            batch_size: default_batch_size(),
            inter_batch_delay_ms: default_inter_batch_delay(),
            interval_secs: default_interval(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先 APP_CONFIG 指定的文件，其次默认路径，失败则使用默认值
    ///
    /// 日志系统此时尚未初始化，加载结果由调用方记录
    pub fn load() -> (Self, String) {
        let mut config_paths: Vec<String> = Vec::new();
        if let Ok(explicit) = std::env::var("APP_CONFIG") {
            config_paths.push(explicit);
        }
        config_paths.push("config.json".to_string());
        config_paths.push("config/config.json".to_string());

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return (config, format!("从 {} 加载配置成功", path)),
                    Err(e) => return (Self::default(), format!("加载配置文件 {} 失败: {}，使用默认配置", path, e)),
                }
            }
        }

        (Self::default(), "使用默认配置".to_string())
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }
}
