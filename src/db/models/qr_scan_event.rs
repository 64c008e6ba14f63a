//! QR Scan Event Model
//!
//! One record per physical scan attempt. Deliberately parallel to
//! `table_session`: the two trails are only correlated best-effort by
//! fingerprint/IP inside a 30-minute window, which is what the pre-session
//! funnel analytics need.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// QR scan attempt entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrScanEvent {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(rename = "dining_table", with = "serde_helpers::record_id")]
    pub table: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub scanned_at: i64,

    #[serde(default)]
    pub otp_entered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_entered_at: Option<i64>,
    #[serde(default)]
    pub otp_attempts: i32,

    #[serde(default)]
    pub order_placed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_placed_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_help_notified_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_help_notified_at: Option<i64>,

    /// Back-link set once the scan is consumed by a session
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub session: Option<RecordId>,
}
