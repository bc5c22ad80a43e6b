//! 业务逻辑服务模块
//!
//! 封装上游数据获取、字段归一化、行情轮询和提醒存储

pub mod adapter;     // 上游字段归一化
pub mod alert_store; // 价格提醒存储
pub mod eodhd;       // EODHD 行情、日历、新闻
pub mod feed;        // 报价缓存与轮询
pub mod marketaux;   // Marketaux 新闻
pub mod openai;      // OpenAI 对话
pub mod polygon;     // Polygon 快照
pub mod upstream;    // 上游 HTTP 客户端
pub mod watchlist;   // 自选股后台任务
