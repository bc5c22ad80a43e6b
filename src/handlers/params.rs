//! 请求参数校验

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::AppError;

static SYMBOL_RE: OnceLock<Regex> = OnceLock::new();

/// 首字符只能是字母、数字或 ^，代码会拼进上游 URL 路径，不能出现 `.` / `..` 段
fn symbol_re() -> &'static Regex {
    SYMBOL_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9^][A-Za-z0-9.^=_\-]{0,31}$").unwrap())
}

/// 单个证券代码
pub fn parse_symbol(name: &str, raw: Option<&str>) -> Result<String, AppError> {
    let symbol = raw.map(str::trim).unwrap_or_default();
    if symbol.is_empty() {
        return Err(AppError::Validation(format!("Missing required parameter: {}", name)));
    }
    if !symbol_re().is_match(symbol) {
        return Err(AppError::Validation(format!("Invalid symbol: {}", symbol)));
    }
    Ok(symbol.to_uppercase())
}

/// 逗号分隔的代码列表，去重并保持顺序，至少一个
pub fn parse_symbols(name: &str, raw: Option<&str>) -> Result<Vec<String>, AppError> {
    let symbols = parse_symbol_list(raw)?;
    if symbols.is_empty() {
        return Err(AppError::Validation(format!("Missing required parameter: {}", name)));
    }
    Ok(symbols)
}

/// 逗号分隔的代码列表，允许为空
pub fn parse_symbol_list(raw: Option<&str>) -> Result<Vec<String>, AppError> {
    let mut symbols: Vec<String> = Vec::new();
    for part in raw.unwrap_or_default().split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !symbol_re().is_match(part) {
            return Err(AppError::Validation(format!("Invalid symbol: {}", part)));
        }
        let symbol = part.to_uppercase();
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}

/// 逗号分隔的标签列表
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// YYYY-MM-DD 日期
pub fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date for {}: expected YYYY-MM-DD", name)))
}

/// 可选日期，存在时校验格式
pub fn optional_date(name: &str, raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => parse_date(name, value).map(|d| Some(d.format("%Y-%m-%d").to_string())),
        None => Ok(None),
    }
}

/// 必填的日期区间，from 不得晚于 to
pub fn date_range(from: Option<&str>, to: Option<&str>) -> Result<(String, String), AppError> {
    let missing: Vec<&str> = [("from", from), ("to", to)]
        .iter()
        .filter(|(_, v)| v.map(str::trim).unwrap_or_default().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!("Missing required parameter: {}", missing.join(", "))));
    }

    let from = parse_date("from", from.unwrap_or_default())?;
    let to = parse_date("to", to.unwrap_or_default())?;
    if from > to {
        return Err(AppError::Validation("from must not be after to".to_string()));
    }
    Ok((from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string()))
}

/// 数量限制，缺省取 default，超出范围时截断到 1..=max
pub fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}
