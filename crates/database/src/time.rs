//! Timestamp helpers.
//!
//! Rows store UTC timestamps as text in SQLite's `datetime('now')` format so
//! values written by Rust and by column defaults compare correctly.

use chrono::{DateTime, Duration, Utc};

/// Format used for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant as a timestamp column value.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The current time as a timestamp column value.
pub fn now() -> String {
    format_timestamp(Utc::now())
}

/// The timestamp `days` days after `from`.
pub fn days_after(from: DateTime<Utc>, days: i64) -> String {
    format_timestamp(from + Duration::days(days))
}
