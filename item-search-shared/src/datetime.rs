//! Date helpers for `createTime` values.
//!
//! Timestamps are stored as epoch milliseconds. Human-readable values are
//! interpreted as UTC. None of these functions fail: input that cannot be
//! parsed yields `None` and the caller decides what an absent value means.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Format used for display and for generated base dates.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.3f",
    DISPLAY_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a date/time string in one of the accepted layouts.
///
/// A bare `YYYY-MM-DD` date resolves to midnight.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Shift `base` by a signed number of days.
pub fn shift_date(base: &str, offset_days: i64) -> Option<NaiveDateTime> {
    let base = parse_date_time(base)?;
    let offset = TimeDelta::try_days(offset_days)?;
    base.checked_add_signed(offset)
}

/// Convert a date/time string to epoch milliseconds.
pub fn to_epoch_millis(text: &str) -> Option<i64> {
    parse_date_time(text).map(|dt| dt.and_utc().timestamp_millis())
}

/// Format epoch milliseconds with [`DISPLAY_FORMAT`].
pub fn format_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format(DISPLAY_FORMAT).to_string())
}

/// The current time formatted with [`DISPLAY_FORMAT`].
pub fn now_formatted() -> String {
    Utc::now().format(DISPLAY_FORMAT).to_string()
}
