//! Timestamp conversion helpers

use chrono::{DateTime, TimeZone, Utc};

/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 1e11;

/// Converts a unix timestamp in seconds (or milliseconds, when large
/// enough to be unambiguous) into a UTC time.
pub fn from_unix(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = if value > MILLIS_THRESHOLD { value } else { value * 1000.0 };
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}
