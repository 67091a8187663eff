//! Timestamp localizer.
//!
//! Elements carrying `data-utc-timestamp` show that UTC instant in the
//! viewer's zone, en-US style: `Dec 9, 2025, 03:45 PM`. Input that does not
//! parse is shown exactly as given.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::dom::{Document, DomOp};
use crate::error::ComponentError;

pub const TIMESTAMP_ATTR: &str = "data-utc-timestamp";

const DISPLAY_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

// Naive forms carry no offset and are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse the accepted UTC timestamp forms.
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>, ComponentError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(ComponentError::ParseFailure {
        input: raw.to_string(),
        reason: "not a recognised timestamp".to_string(),
    })
}

/// Render `raw` in `tz`, or return it unchanged when it does not parse.
pub fn format_timestamp<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match parse_utc(raw) {
        Ok(instant) => instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Leaving timestamp as-is");
            raw.to_string()
        }
    }
}

/// Text updates for every timestamp element on the page.
pub fn localize_all<Tz>(doc: &Document, tz: &Tz) -> Result<Vec<DomOp>, ComponentError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let nodes = doc.query_selector_all(&format!("[{TIMESTAMP_ATTR}]"))?;
    Ok(nodes
        .into_iter()
        .filter_map(|node| {
            let raw = doc.attr(node, TIMESTAMP_ATTR)?;
            Some(DomOp::text(node, format_timestamp(raw, tz)))
        })
        .collect())
}
