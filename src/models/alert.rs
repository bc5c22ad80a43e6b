//! 价格提醒数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 提醒类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Price,
    News,
    Technical,
}

/// 通知方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    Email,
    Sms,
    Push,
}

/// 提醒记录
///
/// 仅保存在进程内存中，重启后丢失
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// 进程内单调递增的编号
    pub id: u64,
    pub user_id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// 触发条件，如 above / below
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
    pub notification_method: NotificationMethod,
    pub contact_info: String,
}

/// 创建提醒请求体
///
/// 所有字段可选，缺失的必填字段由存储层统一校验并报告
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub user_id: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<AlertType>,
    pub condition: Option<String>,
    pub target_value: Option<f64>,
    pub notification_method: Option<NotificationMethod>,
    pub contact_info: Option<String>,
}

/// 更新提醒请求体（浅合并）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPatch {
    pub user_id: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<AlertType>,
    pub condition: Option<String>,
    pub target_value: Option<f64>,
    pub is_active: Option<bool>,
    pub notification_method: Option<NotificationMethod>,
    pub contact_info: Option<String>,
}

/// 提醒查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    /// PUT / DELETE 时必填；GET 时查询单条
    pub id: Option<String>,
    /// GET 时按用户过滤
    pub user_id: Option<String>,
}
