//! Table Cleaning Record Model
//!
//! One record per cleaning cycle: opened when a session ends, closed when
//! staff mark the table cleaned.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One checklist line snapshotted from the restaurant template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub done: bool,
}

/// Cleaning cycle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningRecord {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(rename = "dining_table", with = "serde_helpers::record_id")]
    pub table: RecordId,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub session: Option<RecordId>,
    pub requested_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_sent_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_at: Option<i64>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}
