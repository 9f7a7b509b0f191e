//! Contents of the `<database>.last_restore` marker file.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};

use crate::error::{CoreError, Result};

/// Formats a restore time as an RFC 3339 timestamp with microseconds.
pub fn format_marker(at: DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parses a marker written by [`format_marker`].
///
/// ISO-8601 timestamps without an offset are also accepted and read as
/// local time.
pub fn parse_marker(text: &str) -> Result<DateTime<Local>> {
    let text = text.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| CoreError::InvalidMarker(text.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| CoreError::InvalidMarker(text.to_string()))
}
