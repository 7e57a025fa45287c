// ABOUTME: Utilities for working with event dates.
// ABOUTME: Provides the canonical event date layout plus parsing and formatting helpers.
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Layout used for event dates in the store and in JSON output
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date on the local clock
///
/// # Examples
///
/// ```
/// use rc_core::today;
/// let today = today();
/// assert!(today.to_string().len() == 10);
/// ```
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Timestamp layouts seen in event date columns, tried after the plain date
const EVENT_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an event date as stored by SQLite
///
/// Accepts plain dates, `YYYY-MM-DD HH:MM:SS[.fff]` timestamps, and RFC 3339 timestamps,
/// keeping only the date. Zoned timestamps keep the date in their own offset.
///
/// # Examples
///
/// ```
/// use rc_core::time::parse_event_date;
/// let date = parse_event_date("2021-03-04").unwrap();
/// assert_eq!(date.to_string(), "2021-03-04");
///
/// let date = parse_event_date("2021-03-04T19:00:00Z").unwrap();
/// assert_eq!(date.to_string(), "2021-03-04");
/// ```
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, EVENT_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    EVENT_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
}

/// Format an optional event date, using an empty string when absent
///
/// # Examples
///
/// ```
/// use rc_core::format_event_date;
/// assert_eq!(format_event_date(None), "");
/// ```
pub fn format_event_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(EVENT_DATE_FORMAT).to_string())
        .unwrap_or_default()
}
