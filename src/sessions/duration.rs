//! Stay duration classification and phase inference
//!
//! Pure functions, no I/O. The floor map colors tables by how long guests
//! have been seated, and the phase of a session is always derivable from
//! its timestamp bag; even when upstream data is inconsistent, the latest
//! terminal timestamp wins.

use serde::Serialize;

use crate::db::models::SessionPhase;

/// Floor-map color for a stay duration
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StayColor {
    Green,
    Yellow,
    Orange,
    Red,
}

/// Alert tier derived from a stay duration
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StayAlertLevel {
    None,
    Warning,
    Critical,
}

/// Classification of one stay duration
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StayClassification {
    pub color: StayColor,
    pub label: &'static str,
    pub alert_level: StayAlertLevel,
}

/// Map elapsed minutes to a floor-map classification.
///
/// Cutoffs: 0-29 green, 30-59 yellow, 60-89 orange, 90+ red; the alert
/// level is warning from 90 and critical from 120.
pub fn classify(minutes: u64) -> StayClassification {
    let (color, label) = match minutes {
        0..=29 => (StayColor::Green, "fresh"),
        30..=59 => (StayColor::Yellow, "settled"),
        60..=89 => (StayColor::Orange, "extended"),
        _ => (StayColor::Red, "long stay"),
    };
    let alert_level = match minutes {
        0..=89 => StayAlertLevel::None,
        90..=119 => StayAlertLevel::Warning,
        _ => StayAlertLevel::Critical,
    };
    StayClassification {
        color,
        label,
        alert_level,
    }
}

/// The timestamp bag phase inference works from
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimestamps {
    pub otp_verified: bool,
    pub first_order_at: Option<i64>,
    pub first_food_served_at: Option<i64>,
    pub bill_requested_at: Option<i64>,
    pub payment_completed_at: Option<i64>,
}

/// Infer the current phase from the timestamps, checking terminal markers in
/// reverse priority order. Total: every combination yields exactly one
/// phase, and a later marker always beats an earlier gap (a bill request
/// without a first order still reads BILL_REQUESTED).
pub fn determine_session_phase(ts: &PhaseTimestamps) -> SessionPhase {
    if ts.payment_completed_at.is_some() {
        SessionPhase::Completed
    } else if ts.bill_requested_at.is_some() {
        SessionPhase::BillRequested
    } else if ts.first_food_served_at.is_some() {
        SessionPhase::Dining
    } else if ts.first_order_at.is_some() {
        SessionPhase::Ordering
    } else if ts.otp_verified {
        SessionPhase::Seated
    } else {
        SessionPhase::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_cutoffs() {
        assert_eq!(classify(0).color, StayColor::Green);
        assert_eq!(classify(29).color, StayColor::Green);
        assert_eq!(classify(30).color, StayColor::Yellow);
        assert_eq!(classify(59).color, StayColor::Yellow);
        assert_eq!(classify(60).color, StayColor::Orange);
        assert_eq!(classify(89).color, StayColor::Orange);
        assert_eq!(classify(90).color, StayColor::Red);
        assert_eq!(classify(500).color, StayColor::Red);
    }

    #[test]
    fn alert_level_tiers() {
        assert_eq!(classify(89).alert_level, StayAlertLevel::None);
        assert_eq!(classify(90).alert_level, StayAlertLevel::Warning);
        assert_eq!(classify(119).alert_level, StayAlertLevel::Warning);
        assert_eq!(classify(120).alert_level, StayAlertLevel::Critical);
        assert_eq!(classify(u64::MAX).alert_level, StayAlertLevel::Critical);
    }

    #[test]
    fn phase_priority_chain() {
        let mut ts = PhaseTimestamps::default();
        assert_eq!(determine_session_phase(&ts), SessionPhase::Created);

        ts.otp_verified = true;
        assert_eq!(determine_session_phase(&ts), SessionPhase::Seated);

        ts.first_order_at = Some(1);
        assert_eq!(determine_session_phase(&ts), SessionPhase::Ordering);

        ts.first_food_served_at = Some(2);
        assert_eq!(determine_session_phase(&ts), SessionPhase::Dining);

        ts.bill_requested_at = Some(3);
        assert_eq!(determine_session_phase(&ts), SessionPhase::BillRequested);

        ts.payment_completed_at = Some(4);
        assert_eq!(determine_session_phase(&ts), SessionPhase::Completed);
    }

    #[test]
    fn later_timestamp_wins_on_inconsistent_data() {
        // Bill requested without any order on record
        let ts = PhaseTimestamps {
            bill_requested_at: Some(10),
            ..Default::default()
        };
        assert_eq!(determine_session_phase(&ts), SessionPhase::BillRequested);

        // Payment completed while everything else is missing
        let ts = PhaseTimestamps {
            payment_completed_at: Some(10),
            ..Default::default()
        };
        assert_eq!(determine_session_phase(&ts), SessionPhase::Completed);
    }

    #[test]
    fn adding_a_later_marker_never_moves_the_phase_backwards() {
        // Exhaustive over the five markers: for every combination, setting
        // one more marker must keep the phase the same or advance it.
        for bits in 0u8..32 {
            let build = |bits: u8| PhaseTimestamps {
                otp_verified: bits & 1 != 0,
                first_order_at: (bits & 2 != 0).then_some(1),
                first_food_served_at: (bits & 4 != 0).then_some(2),
                bill_requested_at: (bits & 8 != 0).then_some(3),
                payment_completed_at: (bits & 16 != 0).then_some(4),
            };
            let base = determine_session_phase(&build(bits));
            for extra in [1u8, 2, 4, 8, 16] {
                let widened = determine_session_phase(&build(bits | extra));
                assert!(widened >= base, "bits={bits:05b} extra={extra:05b}");
            }
        }
    }
}
