//! Time helpers. Unix millis everywhere below the API layer.
//!
//! Every timestamp stored in the database is an `i64` of Unix milliseconds;
//! `chrono` is only used to read the clock.

use chrono::Utc;

/// Current time as Unix millis
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Minutes elapsed between two Unix-millis instants, saturating at zero
pub fn elapsed_minutes(since_millis: i64, now_millis: i64) -> i64 {
    ((now_millis - since_millis) / 60_000).max(0)
}

/// Unix millis a given number of minutes before `now_millis`
pub fn minutes_ago(minutes: i64, now_millis: i64) -> i64 {
    now_millis - minutes * 60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_minutes_rounds_down() {
        let start = 1_000_000;
        assert_eq!(elapsed_minutes(start, start + 59_999), 0);
        assert_eq!(elapsed_minutes(start, start + 60_000), 1);
        assert_eq!(elapsed_minutes(start, start + 150_000), 2);
    }

    #[test]
    fn elapsed_minutes_saturates_on_clock_skew() {
        assert_eq!(elapsed_minutes(2_000_000, 1_000_000), 0);
    }

    #[test]
    fn minutes_ago_is_inverse_of_elapsed() {
        let now = 10_000_000;
        let cutoff = minutes_ago(30, now);
        assert_eq!(elapsed_minutes(cutoff, now), 30);
    }
}
