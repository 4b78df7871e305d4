//! The `YYYY-MM-DDTHH:MM:SSZ` timestamp profile used in documents.
//!
//! Dates are always UTC and always second-precision; sub-second parts are
//! truncated on write.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::ParseError;

const PROFILE: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn parse(text: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), PROFILE)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ParseError::Timestamp(text.to_string()))
}

pub fn format(date: &DateTime<Utc>) -> String {
    date.format(PROFILE).to_string()
}
