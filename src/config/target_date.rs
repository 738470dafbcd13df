//! Target date parsing.
//!
//! Accepts RFC 3339 (with or without fractional seconds) and a fixed list of
//! other common layouts. Layouts without a zone are read as UTC.

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use tracing::trace;

use crate::types::error::S3PruneError;

#[derive(Debug, Clone, Copy)]
enum DateLayout {
    Rfc3339,
    Date(&'static str),
    DateTime(&'static str),
    ZoneAbbreviation(&'static str),
    NumericZone(&'static str),
}

/// Layouts tried in order after RFC 3339.
const DATE_LAYOUTS: &[(&str, DateLayout)] = &[
    ("RFC3339", DateLayout::Rfc3339),
    ("YYYY-MM-DD", DateLayout::Date("%Y-%m-%d")),
    ("YYYY-MM-DDTHH:MM:SS", DateLayout::DateTime("%Y-%m-%dT%H:%M:%S")),
    ("YYYY-MM-DD HH:MM:SS", DateLayout::DateTime("%Y-%m-%d %H:%M:%S")),
    ("RFC822", DateLayout::ZoneAbbreviation("%d %b %y %H:%M")),
    ("RFC850", DateLayout::ZoneAbbreviation("%A, %d-%b-%y %H:%M:%S")),
    ("RFC1123", DateLayout::ZoneAbbreviation("%a, %d %b %Y %H:%M:%S")),
    ("RFC1123Z", DateLayout::NumericZone("%a, %d %b %Y %H:%M:%S %z")),
];

const HOUR: i32 = 3600;

/// Parse the target date into a UTC timestamp.
///
/// Fails with [`S3PruneError::InvalidDate`] when no supported layout matches.
///
/// ```
/// use s3prune_rs::config::target_date::parse_target_date;
///
/// let cutoff = parse_target_date("2024-01-15").unwrap();
/// assert_eq!(cutoff.to_rfc3339(), "2024-01-15T00:00:00+00:00");
/// ```
pub fn parse_target_date(date: &str) -> Result<DateTime<Utc>> {
    let date = date.trim();

    for (name, layout) in DATE_LAYOUTS {
        if let Some(parsed) = parse_with_layout(date, *layout) {
            trace!(layout = name, date = date, "target date parsed.");
            return Ok(parsed);
        }
    }

    Err(anyhow!(S3PruneError::InvalidDate(format!(
        "unable to parse date: {date}"
    ))))
}

fn parse_with_layout(date: &str, layout: DateLayout) -> Option<DateTime<Utc>> {
    match layout {
        DateLayout::Rfc3339 => DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        DateLayout::Date(format) => NaiveDate::parse_from_str(date, format)
            .ok()
            .and_then(|parsed| parsed.and_hms_opt(0, 0, 0))
            .map(|parsed| parsed.and_utc()),
        DateLayout::DateTime(format) => NaiveDateTime::parse_from_str(date, format)
            .ok()
            .map(|parsed| parsed.and_utc()),
        DateLayout::ZoneAbbreviation(format) => {
            let (body, zone) = date.rsplit_once(' ')?;
            let offset = FixedOffset::east_opt(zone_offset_seconds(zone)?)?;
            NaiveDateTime::parse_from_str(body, format)
                .ok()?
                .and_local_timezone(offset)
                .single()
                .map(|parsed| parsed.with_timezone(&Utc))
        }
        DateLayout::NumericZone(format) => DateTime::parse_from_str(date, format)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
    }
}

/// Offset of a zone abbreviation, east of UTC.
///
/// The North American zones of RFC 2822 are known; any other alphabetic
/// abbreviation is read as UTC.
///
/// A known abbreviation always applies its fixed offset, whatever the local
/// zone of the host. `... 15:04:05 MST` is 22:04:05 UTC on every machine,
/// which can differ from parsers that treat an abbreviation unknown to the
/// host zone database as a zero-offset zone.
fn zone_offset_seconds(zone: &str) -> Option<i32> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let offset = match zone.to_ascii_uppercase().as_str() {
        "EDT" => -4 * HOUR,
        "EST" | "CDT" => -5 * HOUR,
        "CST" | "MDT" => -6 * HOUR,
        "MST" | "PDT" => -7 * HOUR,
        "PST" => -8 * HOUR,
        _ => 0,
    };

    Some(offset)
}
