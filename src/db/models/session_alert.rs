//! Session Alert Model
//!
//! A staff-facing alert instance tied to one session+table.
//! Lifecycle: ACTIVE → (ACKNOWLEDGED) → RESOLVED; resolving does not require
//! a prior acknowledgment.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Staff roles an alert or notification targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Waiter,
    Manager,
    Cashier,
    Kitchen,
}

/// Alert condition type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    OtpHelp,
    OrderHelp,
    LongStayWarning,
    LongStayCritical,
    CleaningDelay,
    NeedsAttention,
    BillRequested,
}

/// Alert lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

/// Alert priority
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    #[default]
    Normal,
    High,
}

/// Session alert entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAlert {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub session: Option<RecordId>,
    #[serde(rename = "dining_table", with = "serde_helpers::record_id")]
    pub table: RecordId,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    pub message: String,
    pub target_roles: Vec<StaffRole>,
    #[serde(default)]
    pub priority: AlertPriority,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,
}
