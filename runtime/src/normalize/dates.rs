//! Upstream date strings into `dd-mm-yyyy`.

use chrono::{NaiveDate, NaiveDateTime};

/// Format of every normalized date.
pub const OUTPUT_FORMAT: &str = "%d-%m-%Y";

/// Accepted upstream date-time format, e.g. `16-Apr-2025 10:30:00`.
const DATE_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Accepted upstream date format, e.g. `16-Apr-2025`.
const DATE_FORMAT: &str = "%d-%b-%Y";

/// Parse a date in either accepted upstream format.
pub fn parse(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, DATE_FORMAT))
        .ok()
}

/// Normalize `raw`; an unparseable string comes back unchanged.
pub fn normalize(raw: &str) -> String {
    match parse(raw) {
        Some(date) => date.format(OUTPUT_FORMAT).to_string(),
        None => raw.to_string(),
    }
}
