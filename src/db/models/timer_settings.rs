//! Timer Settings Model
//!
//! Per-restaurant help-timer thresholds. A restaurant with no row simply
//! gets [`TimerSettings::default_for`]; absence is not an error.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Per-restaurant threshold configuration (minutes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    pub otp_help_minutes: i64,
    pub order_help_minutes: i64,
    pub long_stay_warning_minutes: i64,
    pub long_stay_critical_minutes: i64,
    pub cleaning_alert_minutes: i64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub checklist_enabled: bool,
    #[serde(default)]
    pub checklist_template: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl TimerSettings {
    /// Documented defaults used when a restaurant has no settings row
    pub fn default_for(restaurant: RecordId) -> Self {
        Self {
            id: None,
            restaurant,
            otp_help_minutes: 2,
            order_help_minutes: 5,
            long_stay_warning_minutes: 90,
            long_stay_critical_minutes: 120,
            cleaning_alert_minutes: 10,
            enabled: true,
            checklist_enabled: false,
            checklist_template: Vec::new(),
        }
    }
}
