use chrono::{DateTime, Timelike, Utc};

/// Truncate `now` to the minute key used in device regimes: zero-padded
/// "HH:MM", 24-hour, UTC.
pub fn minute_key(now: DateTime<Utc>) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}
