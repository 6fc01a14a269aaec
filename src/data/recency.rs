//! Relative-time labels for the last-updated element.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp layout used when the server omits a UTC offset.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse an ISO-8601 timestamp like "2024-05-01T12:00:00.123456+00:00".
///
/// Timestamps without an offset are taken to be UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let s = s.trim();
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(err) => NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| err),
    }
}

/// Format an elapsed time in whole seconds as "Just now", "N minutes ago"
/// or "N hours ago".
///
/// Negative values (a timestamp slightly ahead of the local clock) read as
/// "Just now".
pub fn format_relative(elapsed_secs: i64) -> String {
    if elapsed_secs < 60 {
        "Just now".to_string()
    } else if elapsed_secs < 3600 {
        let minutes = elapsed_secs / 60;
        format!("{} minute{} ago", minutes, plural(minutes))
    } else {
        let hours = elapsed_secs / 3600;
        format!("{} hour{} ago", hours, plural(hours))
    }
}

/// Label for how long ago `at` was, measured from `now`.
pub fn relative_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_relative((now - at).num_seconds())
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
