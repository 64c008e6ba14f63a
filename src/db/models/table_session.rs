//! Table Session Model
//!
//! One record per guest occupancy of a table, from QR scan/seating through
//! payment. Phase only ever moves forward along the fixed sequence; a
//! COMPLETED session is immutable.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Session record status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Session lifecycle phase, in order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Created,
    Seated,
    Ordering,
    Dining,
    BillRequested,
    Paying,
    Completed,
}

/// Table session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSession {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    /// Stored as `dining_table` because `table` is a reserved word in SurrealQL
    #[serde(rename = "dining_table", with = "serde_helpers::record_id")]
    pub table: RecordId,
    pub status: SessionStatus,
    pub phase: SessionPhase,
    #[serde(default)]
    pub guest_count: i32,
    #[serde(default)]
    pub otp_verified: bool,

    // Phase-transition timestamps (Unix millis)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_scanned_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_order_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_food_served_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_requested_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiter_notified_at: Option<i64>,

    // Notification dedupe markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_help_notified_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_help_notified_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_stay_alert_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_stay_critical_at: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
    pub created_at: i64,
}

/// Create session payload
#[derive(Debug, Clone)]
pub struct TableSessionCreate {
    pub restaurant: RecordId,
    pub table: RecordId,
    pub guest_count: i32,
    pub qr_scanned_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_ordering_follows_lifecycle() {
        assert!(SessionPhase::Created < SessionPhase::Seated);
        assert!(SessionPhase::Seated < SessionPhase::Ordering);
        assert!(SessionPhase::Ordering < SessionPhase::Dining);
        assert!(SessionPhase::Dining < SessionPhase::BillRequested);
        assert!(SessionPhase::BillRequested < SessionPhase::Paying);
        assert!(SessionPhase::Paying < SessionPhase::Completed);
    }

    #[test]
    fn phase_serializes_screaming_snake() {
        let json = serde_json::to_string(&SessionPhase::BillRequested).unwrap();
        assert_eq!(json, "\"BILL_REQUESTED\"");
    }
}
