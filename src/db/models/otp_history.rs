//! OTP History Model (append-only)

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Why a new OTP was issued
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpReason {
    Manual,
    CleaningComplete,
}

/// One issued OTP. Never mutated, only inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpHistory {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(rename = "dining_table", with = "serde_helpers::record_id")]
    pub table: RecordId,
    pub otp: String,
    pub reason: OtpReason,
    /// Session whose completion consumed the previous code
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub session: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    pub issued_at: i64,
}
