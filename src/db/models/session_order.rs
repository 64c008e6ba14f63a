//! Session Order Read-Model
//!
//! Orders placed during a session, written by the ordering pipeline.
//! This service only reads them for timeline reconstruction.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One ordered line with its kitchen progress timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOrderItem {
    pub name: String,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
}

/// Placed order entity (read-only here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOrder {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub session: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub placed_at: i64,
    #[serde(default)]
    pub items: Vec<SessionOrderItem>,
}
