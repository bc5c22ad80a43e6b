//! 行情数据模型
//!
//! 上游数据经字段适配后得到的规范记录，与具体数据源无关

use serde::{Deserialize, Serialize};

/// 实时报价
///
/// 每轮拉取时生成，不做持久化。数值字段缺失或为 "NA" 时为 null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// 证券代码（输出字段名为 code）
    #[serde(rename = "code")]
    pub symbol: String,
    /// 最新价
    pub price: Option<f64>,
    /// 涨跌额
    pub change: Option<f64>,
    /// 涨跌幅（百分比）
    pub change_percent: Option<f64>,
    /// 昨收价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    /// 上游时间戳
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Quote {
    /// 价格存在且大于 0
    pub fn has_valid_price(&self) -> bool {
        matches!(self.price, Some(p) if p > 0.0)
    }
}

/// 日线数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}

/// 经济事件重要性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
    Unknown,
}

impl Importance {
    /// 按小写名称解析，无法识别时为 Unknown
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" | "3" => Importance::High,
            "medium" | "moderate" | "2" => Importance::Medium,
            "low" | "1" => Importance::Low,
            _ => Importance::Unknown,
        }
    }
}

/// 经济日历事件
///
/// previous / forecast / actual 原样保留，缺失时为空字符串
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub datetime_utc: String,
    pub country: String,
    pub event: String,
    pub category: String,
    pub importance: Importance,
    pub previous: String,
    pub forecast: String,
    pub actual: String,
}

/// 新闻条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub date: String,
    pub title: String,
    pub content: String,
    /// 关联证券代码
    pub symbols: Vec<String>,
    pub tags: Vec<String>,
    /// 原文链接
    pub link: String,
    /// 情绪分值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

/// 报价查询参数
#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    /// 逗号分隔的代码列表
    pub symbols: Option<String>,
}

/// Polygon 快照查询参数
#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    /// 逗号分隔的代码列表
    pub tickers: Option<String>,
}

/// 自选股查询参数
#[derive(Debug, Deserialize)]
pub struct WatchlistQuery {
    /// 只返回单个代码的缓存条目
    pub symbol: Option<String>,
}

/// 历史价格查询参数
#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub symbol: Option<String>,
    /// 开始日期（YYYY-MM-DD）
    pub from: Option<String>,
    /// 结束日期（YYYY-MM-DD）
    pub to: Option<String>,
    /// d / w / m
    pub period: Option<String>,
}

/// 经济日历查询参数
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// ISO 国家代码
    pub country: Option<String>,
    pub limit: Option<usize>,
}

/// 新闻查询参数
#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub symbols: Option<String>,
    pub tags: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
