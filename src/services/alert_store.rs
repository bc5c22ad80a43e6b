//! 价格提醒存储
//!
//! 进程内存储，启动时创建一次并注入到各处理器，重启后数据丢失。
//! 编号来自存储自身的单调计数器，从 1 开始。

use chrono::Utc;
use parking_lot::Mutex;

use crate::error::AppError;
use crate::models::{Alert, AlertPatch, AlertType, NewAlert};
use crate::services::feed::QuoteCache;

#[derive(Default)]
struct AlertState {
    alerts: Vec<Alert>,
    last_id: u64,
}

#[derive(Default)]
pub struct AlertStore {
    state: Mutex<AlertState>,
}

/// 价格比较方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Above,
    Below,
}

fn parse_direction(condition: &str) -> Option<Direction> {
    match condition.trim().to_lowercase().as_str() {
        "above" | ">" | ">=" | "price_above" => Some(Direction::Above),
        "below" | "<" | "<=" | "price_below" => Some(Direction::Below),
        _ => None,
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_ref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部提醒，可按用户过滤
    pub fn list(&self, user_id: Option<&str>) -> Vec<Alert> {
        let state = self.state.lock();
        state
            .alerts
            .iter()
            .filter(|a| user_id.map_or(true, |u| a.user_id == u))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Alert> {
        self.state.lock().alerts.iter().find(|a| a.id == id).cloned()
    }

    /// 创建提醒，缺少必填字段时返回 Validation 错误并列出全部缺失字段
    pub fn create(&self, input: NewAlert) -> Result<Alert, AppError> {
        let mut missing = Vec::new();
        if !non_blank(&input.user_id) {
            missing.push("userId");
        }
        if !non_blank(&input.symbol) {
            missing.push("symbol");
        }
        if input.alert_type.is_none() {
            missing.push("type");
        }
        if !non_blank(&input.condition) {
            missing.push("condition");
        }
        if input.notification_method.is_none() {
            missing.push("notificationMethod");
        }
        if !non_blank(&input.contact_info) {
            missing.push("contactInfo");
        }

        let (
            Some(user_id),
            Some(symbol),
            Some(alert_type),
            Some(condition),
            Some(notification_method),
            Some(contact_info),
        ) = (
            input.user_id,
            input.symbol,
            input.alert_type,
            input.condition,
            input.notification_method,
            input.contact_info,
        )
        else {
            return Err(AppError::Validation(format!("Missing required fields: {}", missing.join(", "))));
        };
        if !missing.is_empty() {
            return Err(AppError::Validation(format!("Missing required fields: {}", missing.join(", "))));
        }

        let mut state = self.state.lock();
        state.last_id += 1;
        let alert = Alert {
            id: state.last_id,
            user_id,
            symbol: symbol.trim().to_uppercase(),
            alert_type,
            condition,
            target_value: input.target_value,
            is_active: true,
            created_at: Utc::now(),
            triggered_at: None,
            notification_method,
            contact_info,
        };
        state.alerts.push(alert.clone());

        log::info!("创建提醒 #{} ({} {})", alert.id, alert.symbol, alert.condition);
        Ok(alert)
    }

    /// 浅合并更新；未提供的字段（包括 isActive）保持原值
    pub fn update(&self, id: u64, patch: AlertPatch) -> Option<Alert> {
        let mut state = self.state.lock();
        let alert = state.alerts.iter_mut().find(|a| a.id == id)?;

        if let Some(user_id) = patch.user_id {
            alert.user_id = user_id;
        }
        if let Some(symbol) = patch.symbol {
            alert.symbol = symbol.trim().to_uppercase();
        }
        if let Some(alert_type) = patch.alert_type {
            alert.alert_type = alert_type;
        }
        if let Some(condition) = patch.condition {
            alert.condition = condition;
        }
        if let Some(target_value) = patch.target_value {
            alert.target_value = Some(target_value);
        }
        if let Some(is_active) = patch.is_active {
            alert.is_active = is_active;
        }
        if let Some(method) = patch.notification_method {
            alert.notification_method = method;
        }
        if let Some(contact_info) = patch.contact_info {
            alert.contact_info = contact_info;
        }

        Some(alert.clone())
    }

    pub fn delete(&self, id: u64) -> Option<Alert> {
        let mut state = self.state.lock();
        let index = state.alerts.iter().position(|a| a.id == id)?;
        Some(state.alerts.remove(index))
    }

    /// 用自选股缓存中的最后已知价格检查价格提醒
    ///
    /// 命中的提醒写入触发时间并停用，返回本次触发的提醒。
    /// 新闻和技术指标提醒不在这里检查。
    pub fn evaluate(&self, cache: &QuoteCache) -> Vec<Alert> {
        let mut state = self.state.lock();
        let mut triggered = Vec::new();

        for alert in state.alerts.iter_mut().filter(|a| a.is_active) {
            if alert.alert_type != AlertType::Price {
                continue;
            }
            let (Some(target), Some(direction)) = (alert.target_value, parse_direction(&alert.condition)) else {
                continue;
            };
            let Some(price) = cache.last_price(&alert.symbol) else {
                continue;
            };

            let hit = match direction {
                Direction::Above => price >= target,
                Direction::Below => price <= target,
            };
            if hit {
                alert.is_active = false;
                alert.triggered_at = Some(Utc::now());
                log::info!(
                    "提醒 #{} 触发: {} 价格 {} {} {}，通知方式 {:?} -> {}",
                    alert.id,
                    alert.symbol,
                    price,
                    alert.condition,
                    target,
                    alert.notification_method,
                    alert.contact_info
                );
                triggered.push(alert.clone());
            }
        }

        triggered
    }
}
