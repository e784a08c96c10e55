//! Timestamp parsing for command-line arguments.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pvsite_history_core::Timestamp;

use crate::error::{CliResult, InvalidTimestampSnafu};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> CliResult<Timestamp> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    InvalidTimestampSnafu { value }.fail()
}

pub fn parse_optional(value: Option<&str>) -> CliResult<Option<Timestamp>> {
    value.map(parse_timestamp).transpose()
}
