//! Time and timestamp helpers.
//!
//! The remote platform reports timestamps as fractional Unix seconds while
//! local bookkeeping uses integer milliseconds.

use chrono::{DateTime, Utc};

/// UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current UTC time as Unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    now().timestamp_millis()
}

/// Convert a remote timestamp (fractional seconds) into whole milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn remote_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_floor_remote_seconds_to_millis() {
        assert_eq!(remote_to_millis(1_700_000_000.123_9), 1_700_000_000_123);
        assert_eq!(remote_to_millis(0.0), 0);
    }

    #[test]
    fn should_report_millis_close_to_now() {
        let before = Utc::now().timestamp_millis();
        let ms = now_millis();
        assert!(ms >= before);
    }
}
