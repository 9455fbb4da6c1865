//! Wire timestamp helpers
//!
//! Timestamps travel as local naive ISO-8601 strings with microsecond
//! precision (`2026-08-22T14:03:55.123456`). The client reformats them
//! to clock time for display and falls back to the raw string when a
//! peer sends something unparseable.

use chrono::{Local, NaiveDateTime};

/// Wire format: date and time with a six-digit second fraction
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Parse format for inbound timestamps (fraction optional)
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Current local time in wire format
pub fn now_ts() -> String {
    Local::now().format(WIRE_FORMAT).to_string()
}

/// Render a wire timestamp as `HH:MM:SS` clock time
///
/// Returns the input unchanged when it does not parse.
pub fn clock_time(ts: &str) -> String {
    match NaiveDateTime::parse_from_str(ts, PARSE_FORMAT) {
        Ok(dt) => dt.format("%H:%M:%S").to_string(),
        Err(_) => ts.to_string(),
    }
}
