//! 字段适配
//!
//! 把不同数据源、不同字段名的原始 JSON 映射为规范记录。
//! 每个规范字段对应一张有序的 `(JSON Pointer, 解析函数)` 规则表，
//! 取第一个解析成功的候选值，优先级即表中顺序。
//!
//! "NA"、"N/A"、空字符串、"null" 视为无值：跳过该候选，全部落空时字段为 null。

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{CalendarEvent, Importance, NewsArticle, PriceBar, Quote};

/// 单条取值规则
#[derive(Clone, Copy)]
pub struct FieldRule<T: 'static> {
    /// JSON Pointer，如 `/close`、`/prevDay/c`
    pub pointer: &'static str,
    pub parse: fn(&Value) -> Option<T>,
}

const fn rule<T>(pointer: &'static str, parse: fn(&Value) -> Option<T>) -> FieldRule<T> {
    FieldRule { pointer, parse }
}

/// 按规则表顺序取第一个有效值
pub fn pick<T>(raw: &Value, rules: &[FieldRule<T>]) -> Option<T> {
    rules
        .iter()
        .find_map(|r| raw.pointer(r.pointer).and_then(r.parse))
}

// ==================== 规则表 ====================

pub const QUOTE_SYMBOL: &[FieldRule<String>] = &[
    rule("/code", parse_text),
    rule("/symbol", parse_text),
    rule("/ticker", parse_text),
];
pub const QUOTE_PRICE: &[FieldRule<f64>] = &[
    rule("/close", parse_number),
    rule("/price", parse_number),
    rule("/last", parse_number),
    rule("/value", parse_number),
    rule("/lastTrade/p", parse_number),
    rule("/day/c", parse_number),
];
pub const QUOTE_PREVIOUS_CLOSE: &[FieldRule<f64>] = &[
    rule("/previousClose", parse_number),
    rule("/previous_close", parse_number),
    rule("/prevDay/c", parse_number),
];
pub const QUOTE_CHANGE: &[FieldRule<f64>] = &[
    rule("/change", parse_number),
    rule("/todaysChange", parse_number),
];
pub const QUOTE_CHANGE_PERCENT: &[FieldRule<f64>] = &[
    rule("/change_p", parse_number),
    rule("/change_percent", parse_number),
    rule("/todaysChangePerc", parse_number),
];
pub const QUOTE_TIMESTAMP: &[FieldRule<i64>] = &[
    rule("/timestamp", parse_integer),
    rule("/updated", parse_integer),
];

pub const EVENT_DATETIME: &[FieldRule<String>] = &[
    rule("/date", parse_text),
    rule("/datetime", parse_text),
];
pub const EVENT_COUNTRY: &[FieldRule<String>] = &[rule("/country", parse_text)];
pub const EVENT_NAME: &[FieldRule<String>] = &[
    rule("/event", parse_text),
    rule("/type", parse_text),
];
pub const EVENT_CATEGORY: &[FieldRule<String>] = &[
    rule("/category", parse_text),
    rule("/period", parse_text),
];
pub const EVENT_IMPORTANCE: &[FieldRule<String>] = &[rule("/importance", parse_text)];
pub const EVENT_PREVIOUS: &[FieldRule<String>] = &[rule("/previous", parse_text)];
pub const EVENT_FORECAST: &[FieldRule<String>] = &[
    rule("/estimate", parse_text),
    rule("/forecast", parse_text),
];
pub const EVENT_ACTUAL: &[FieldRule<String>] = &[rule("/actual", parse_text)];

pub const NEWS_DATE: &[FieldRule<String>] = &[
    rule("/date", parse_text),
    rule("/datetime", parse_text),
    rule("/published_at", parse_text),
];
pub const NEWS_TITLE: &[FieldRule<String>] = &[rule("/title", parse_text)];
pub const NEWS_CONTENT: &[FieldRule<String>] = &[
    rule("/content", parse_text),
    rule("/description", parse_text),
    rule("/snippet", parse_text),
];
pub const NEWS_SYMBOLS: &[FieldRule<Vec<String>>] = &[
    rule("/symbols", parse_string_list),
    rule("/entities", parse_entity_symbols),
];
pub const NEWS_TAGS: &[FieldRule<Vec<String>>] = &[
    rule("/tags", parse_string_list),
    rule("/keywords", parse_string_list),
];
pub const NEWS_LINK: &[FieldRule<String>] = &[
    rule("/link", parse_text),
    rule("/url", parse_text),
];
pub const NEWS_SENTIMENT: &[FieldRule<f64>] = &[
    rule("/sentiment/polarity", parse_number),
    rule("/sentiment_score", parse_number),
    rule("/entities", parse_entity_sentiment),
    rule("/sentiment", parse_number),
];

pub const BAR_DATE: &[FieldRule<String>] = &[rule("/date", parse_text)];
pub const BAR_OPEN: &[FieldRule<f64>] = &[rule("/open", parse_number)];
pub const BAR_HIGH: &[FieldRule<f64>] = &[rule("/high", parse_number)];
pub const BAR_LOW: &[FieldRule<f64>] = &[rule("/low", parse_number)];
pub const BAR_CLOSE: &[FieldRule<f64>] = &[rule("/close", parse_number)];
pub const BAR_ADJUSTED_CLOSE: &[FieldRule<f64>] = &[
    rule("/adjusted_close", parse_number),
    rule("/adjustedClose", parse_number),
];
pub const BAR_VOLUME: &[FieldRule<f64>] = &[rule("/volume", parse_number)];

// ==================== 解析函数 ====================

/// 上游用来表示"无值"的占位字符串
fn is_missing(s: &str) -> bool {
    let s = s.trim();
    s.is_empty()
        || s.eq_ignore_ascii_case("NA")
        || s.eq_ignore_ascii_case("N/A")
        || s.eq_ignore_ascii_case("null")
}

/// 有限数值；字符串形式的数字同样接受
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !is_missing(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) if !is_missing(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// 文本原样保留；数值转为字符串
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_missing(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 字符串数组，或逗号分隔的字符串
pub fn parse_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(parse_text)
                .map(|s| s.trim().to_string())
                .collect(),
        ),
        Value::String(s) if !is_missing(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|part| !is_missing(part))
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// Marketaux 的 entities 数组中的 symbol
fn parse_entity_symbols(value: &Value) -> Option<Vec<String>> {
    let entities = value.as_array()?;
    Some(
        entities
            .iter()
            .filter_map(|e| e.get("symbol").and_then(parse_text))
            .collect(),
    )
}

/// Marketaux 各 entity sentiment_score 的平均值
fn parse_entity_sentiment(value: &Value) -> Option<f64> {
    let scores: Vec<f64> = value
        .as_array()?
        .iter()
        .filter_map(|e| e.get("sentiment_score").and_then(parse_number))
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// "YYYY-MM-DD HH:MM:SS"（UTC）转为 RFC 3339，其他格式原样返回
fn normalize_utc_datetime(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        }
    }
    raw.to_string()
}

// ==================== 规范记录 ====================

/// 由单条原始记录构造规范记录，纯函数
pub trait Adapt: Sized {
    fn adapt(raw: &Value) -> Self;
}

impl Adapt for Quote {
    fn adapt(raw: &Value) -> Self {
        let price = pick(raw, QUOTE_PRICE);
        let previous_close = pick(raw, QUOTE_PREVIOUS_CLOSE);

        let change = pick(raw, QUOTE_CHANGE).or_else(|| match (price, previous_close) {
            (Some(p), Some(prev)) => Some(p - prev),
            _ => None,
        });
        let change_percent = pick(raw, QUOTE_CHANGE_PERCENT).or_else(|| match (change, previous_close) {
            (Some(_), Some(prev)) if prev <= 0.0 => Some(0.0),
            (Some(c), Some(prev)) => Some(c / prev * 100.0),
            _ => None,
        });

        Quote {
            symbol: pick(raw, QUOTE_SYMBOL).unwrap_or_default(),
            price,
            change,
            change_percent,
            previous_close,
            timestamp: pick(raw, QUOTE_TIMESTAMP),
        }
    }
}

impl Adapt for CalendarEvent {
    fn adapt(raw: &Value) -> Self {
        CalendarEvent {
            datetime_utc: pick(raw, EVENT_DATETIME)
                .map(|d| normalize_utc_datetime(&d))
                .unwrap_or_default(),
            country: pick(raw, EVENT_COUNTRY).unwrap_or_default(),
            event: pick(raw, EVENT_NAME).unwrap_or_default(),
            category: pick(raw, EVENT_CATEGORY).unwrap_or_default(),
            importance: pick(raw, EVENT_IMPORTANCE)
                .map(|label| Importance::from_label(&label))
                .unwrap_or(Importance::Unknown),
            previous: pick(raw, EVENT_PREVIOUS).unwrap_or_default(),
            forecast: pick(raw, EVENT_FORECAST).unwrap_or_default(),
            actual: pick(raw, EVENT_ACTUAL).unwrap_or_default(),
        }
    }
}

impl Adapt for NewsArticle {
    fn adapt(raw: &Value) -> Self {
        NewsArticle {
            date: pick(raw, NEWS_DATE).unwrap_or_default(),
            title: pick(raw, NEWS_TITLE).unwrap_or_default(),
            content: pick(raw, NEWS_CONTENT).unwrap_or_default(),
            symbols: pick(raw, NEWS_SYMBOLS).unwrap_or_default(),
            tags: pick(raw, NEWS_TAGS).unwrap_or_default(),
            link: pick(raw, NEWS_LINK).unwrap_or_default(),
            sentiment: pick(raw, NEWS_SENTIMENT),
        }
    }
}

impl Adapt for PriceBar {
    fn adapt(raw: &Value) -> Self {
        PriceBar {
            date: pick(raw, BAR_DATE).unwrap_or_default(),
            open: pick(raw, BAR_OPEN),
            high: pick(raw, BAR_HIGH),
            low: pick(raw, BAR_LOW),
            close: pick(raw, BAR_CLOSE),
            adjusted_close: pick(raw, BAR_ADJUSTED_CLOSE),
            volume: pick(raw, BAR_VOLUME),
        }
    }
}

/// 适配一组记录
///
/// 接受数组、单个对象，或把数组包在 `data` / `tickers` / `results` 字段中的响应
pub fn adapt_all<T: Adapt>(raw: &Value) -> Vec<T> {
    let records: &[Value] = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => {
            match ["data", "tickers", "results"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
            {
                Some(items) => items.as_slice(),
                None => std::slice::from_ref(raw),
            }
        }
        _ => &[],
    };
    records.iter().filter(|r| r.is_object()).map(T::adapt).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_na_numeric_fields_become_null() {
        let raw = json!({ "code": "MSFT.US", "close": "NA", "change": "NA", "change_p": "NA", "previousClose": "NA" });
        let quote = Quote::adapt(&raw);

        assert_eq!(quote.symbol, "MSFT.US");
        assert_eq!(quote.price, None);
        assert_eq!(quote.change, None);
        assert_eq!(quote.change_percent, None);
        assert_eq!(quote.previous_close, None);
    }

    #[test]
    fn test_na_falls_through_to_next_candidate() {
        let raw = json!({ "code": "X", "close": "NA", "price": "12.5" });
        assert_eq!(Quote::adapt(&raw).price, Some(12.5));
    }

    #[test]
    fn test_price_precedence_follows_rule_order() {
        let raw = json!({ "code": "X", "value": 1.0, "last": 2.0, "price": 3.0, "close": 4.0 });
        assert_eq!(Quote::adapt(&raw).price, Some(4.0));

        let raw = json!({ "code": "X", "value": 1.0, "last": 2.0 });
        assert_eq!(Quote::adapt(&raw).price, Some(2.0));
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!(" 42.5 ")), Some(42.5));
    }

    #[test]
    fn test_change_derived_from_previous_close() {
        let raw = json!({ "code": "AAPL.US", "close": 110.0, "previousClose": 100.0 });
        let quote = Quote::adapt(&raw);

        assert_eq!(quote.change, Some(10.0));
        assert_eq!(quote.change_percent, Some(10.0));
    }

    #[test]
    fn test_change_percent_guarded_for_non_positive_previous_close() {
        let raw = json!({ "code": "X", "close": 5.0, "previousClose": 0 });
        let quote = Quote::adapt(&raw);

        assert_eq!(quote.change, Some(5.0));
        assert_eq!(quote.change_percent, Some(0.0));
    }

    #[test]
    fn test_explicit_change_wins_over_derived() {
        let raw = json!({ "code": "X", "close": 110.0, "previousClose": 100.0, "change": 7.0 });
        let quote = Quote::adapt(&raw);

        assert_eq!(quote.change, Some(7.0));
        assert_eq!(quote.change_percent, Some(7.0));
    }

    #[test]
    fn test_polygon_snapshot_nested_fields() {
        let raw = json!({
            "ticker": "AAPL",
            "todaysChange": 1.5,
            "todaysChangePerc": 0.8,
            "day": { "c": 190.0 },
            "lastTrade": { "p": 191.2 },
            "prevDay": { "c": 189.7 },
            "updated": 1700000000000i64
        });
        let quote = Quote::adapt(&raw);

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, Some(191.2));
        assert_eq!(quote.previous_close, Some(189.7));
        assert_eq!(quote.change, Some(1.5));
        assert_eq!(quote.change_percent, Some(0.8));
        assert_eq!(quote.timestamp, Some(1700000000000));
    }

    #[test]
    fn test_adapter_is_idempotent() {
        let raw = json!({ "code": "AAPL.US", "close": 150.2, "previousClose": 149.0, "timestamp": 1 });
        assert_eq!(Quote::adapt(&raw), Quote::adapt(&raw));

        let raw = json!({ "date": "2024-01-05 13:30:00", "type": "Nonfarm Payrolls", "actual": 216 });
        assert_eq!(CalendarEvent::adapt(&raw), CalendarEvent::adapt(&raw));
    }

    #[test]
    fn test_calendar_event_preserves_values_verbatim() {
        let raw = json!({
            "date": "2024-01-05 13:30:00",
            "country": "US",
            "type": "Nonfarm Payrolls",
            "period": "Dec",
            "importance": "High",
            "previous": "199K",
            "estimate": 170.5,
            "actual": "216K"
        });
        let event = CalendarEvent::adapt(&raw);

        assert_eq!(event.datetime_utc, "2024-01-05T13:30:00Z");
        assert_eq!(event.country, "US");
        assert_eq!(event.event, "Nonfarm Payrolls");
        assert_eq!(event.category, "Dec");
        assert_eq!(event.importance, Importance::High);
        assert_eq!(event.previous, "199K");
        assert_eq!(event.forecast, "170.5");
        assert_eq!(event.actual, "216K");
    }

    #[test]
    fn test_calendar_event_missing_values_are_empty_strings() {
        let raw = json!({ "datetime": "2024-01-05", "event": "CPI", "actual": null, "previous": "NA" });
        let event = CalendarEvent::adapt(&raw);

        assert_eq!(event.datetime_utc, "2024-01-05T00:00:00Z");
        assert_eq!(event.importance, Importance::Unknown);
        assert_eq!(event.previous, "");
        assert_eq!(event.forecast, "");
        assert_eq!(event.actual, "");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["actual"], "");
        assert_eq!(json["forecast"], "");
    }

    #[test]
    fn test_eodhd_news_article() {
        let raw = json!({
            "date": "2024-03-01T12:00:00+00:00",
            "title": "Apple rallies",
            "content": "Shares rose.",
            "link": "https://example.com/a",
            "symbols": ["AAPL.US"],
            "tags": ["TECH"],
            "sentiment": { "polarity": 0.6, "neg": 0.0, "neu": 0.4, "pos": 0.6 }
        });
        let article = NewsArticle::adapt(&raw);

        assert_eq!(article.symbols, vec!["AAPL.US"]);
        assert_eq!(article.tags, vec!["TECH"]);
        assert_eq!(article.sentiment, Some(0.6));
    }

    #[test]
    fn test_news_defaults_missing_lists() {
        let article = NewsArticle::adapt(&json!({ "published_at": "2024-03-01", "title": "t" }));

        assert_eq!(article.date, "2024-03-01");
        assert!(article.symbols.is_empty());
        assert!(article.tags.is_empty());
        assert_eq!(article.sentiment, None);
    }

    #[test]
    fn test_marketaux_article() {
        let raw = json!({
            "published_at": "2024-03-01T10:00:00.000000Z",
            "title": "Chip stocks",
            "description": "Summary",
            "url": "https://example.com/b",
            "keywords": "chips, semis",
            "entities": [
                { "symbol": "NVDA", "sentiment_score": 0.5 },
                { "symbol": "AMD", "sentiment_score": 0.1 }
            ]
        });
        let article = NewsArticle::adapt(&raw);

        assert_eq!(article.content, "Summary");
        assert_eq!(article.link, "https://example.com/b");
        assert_eq!(article.symbols, vec!["NVDA", "AMD"]);
        assert_eq!(article.tags, vec!["chips", "semis"]);
        assert!((article.sentiment.unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_adapt_all_unwraps_containers() {
        let wrapped = json!({ "data": [{ "title": "a" }, { "title": "b" }] });
        assert_eq!(adapt_all::<NewsArticle>(&wrapped).len(), 2);

        let single = json!({ "code": "AAPL.US", "close": 1.0 });
        assert_eq!(adapt_all::<Quote>(&single).len(), 1);

        let bars = json!([{ "date": "2024-01-02", "close": 10, "adjusted_close": "NA", "volume": 100 }, 5]);
        let parsed = adapt_all::<PriceBar>(&bars);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].adjusted_close, None);
        assert_eq!(parsed[0].volume, Some(100.0));

        assert!(adapt_all::<Quote>(&json!("oops")).is_empty());
    }
}
