//! Restricted ISO-8601 UTC timestamps.
//!
//! Accepted input is `YYYY-MM-DDTHH:MM[:SS[.fraction]][Z]`; only a single
//! trailing `Z` is stripped, so `...ZZ` is rejected. Fractional seconds longer
//! than six digits are truncated to microseconds. Output is always the
//! canonical `Z`-suffixed form with seconds, plus a six digit fraction when the
//! value has a sub-second part.

use crate::error::TimestampError;
use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Maximum number of fractional digits kept.
const FRACTION_DIGITS: usize = 6;

/// Parse a UTC timestamp.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, TimestampError> {
    let timestamp = timestamp.strip_suffix('Z').unwrap_or(timestamp);

    let mut halves = timestamp.split('T');
    let (date, time) = match (halves.next(), halves.next(), halves.next()) {
        (Some(date), Some(time), None) => (date, time),
        _ => return Err(TimestampError::MissingSeparator),
    };

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        TimestampError::InvalidField {
            field: "date",
            value: date.to_string(),
        }
    })?;

    let components: Vec<&str> = time.split(':').collect();
    if !matches!(components.len(), 2 | 3) {
        return Err(TimestampError::InvalidTimeComponents {
            count: components.len(),
        });
    }

    let hour = parse_field("hour", components[0])?;
    let minute = parse_field("minute", components[1])?;
    let (second, micro) = match components.get(2) {
        Some(seconds) => parse_seconds(seconds)?,
        None => (0, 0),
    };

    date.and_hms_micro_opt(hour, minute, second, micro)
        .map(|naive| naive.and_utc())
        .ok_or(TimestampError::OutOfRange)
}

/// Serialize a timestamp in canonical form.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let base = timestamp.format("%Y-%m-%dT%H:%M:%S");
    match timestamp.timestamp_subsec_micros() {
        0 => format!("{base}Z"),
        micros => format!("{base}.{micros:06}Z"),
    }
}

/// Drop sub-microsecond precision so the value survives a format/parse cycle.
pub fn truncate_to_micros(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = timestamp.nanosecond();
    timestamp
        .with_nanosecond(nanos - nanos % 1_000)
        .unwrap_or(timestamp)
}

/// Current time at microsecond precision.
pub fn now() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

fn parse_field(field: &'static str, value: &str) -> Result<u32, TimestampError> {
    let invalid = || TimestampError::InvalidField {
        field,
        value: value.to_string(),
    };

    if !(1..=2).contains(&value.len()) || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

fn parse_seconds(seconds: &str) -> Result<(u32, u32), TimestampError> {
    let Some((whole, fraction)) = seconds.split_once('.') else {
        return Ok((parse_field("second", seconds)?, 0));
    };

    if fraction.is_empty()
        || fraction.contains('.')
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(TimestampError::InvalidFraction);
    }

    let second = parse_field("second", whole)?;
    let kept = &fraction[..fraction.len().min(FRACTION_DIGITS)];
    let micro = format!("{kept:0<width$}", width = FRACTION_DIGITS)
        .parse()
        .map_err(|_| TimestampError::InvalidFraction)?;

    Ok((second, micro))
}
