//! Guest Count History Model (append-only audit)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One guest-count edit during a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestCountHistory {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub session: RecordId,
    pub previous_count: i32,
    pub new_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    pub changed_at: i64,
}
