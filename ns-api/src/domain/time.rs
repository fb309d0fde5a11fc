//! Timestamp handling for NS API responses.
//!
//! The API writes timestamps as `2012-02-27T15:43:00+0100`: an offset
//! suffix without a colon. Formats ending in `%z` are parsed by cutting
//! that fixed-width suffix off and attaching it as a [`FixedOffset`];
//! every other format yields a naive timestamp.

use std::fmt::{self, Write};

use chrono::format::{ParseErrorKind, ParseResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// The format the API uses for every timezone-qualified timestamp.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Trailing token that marks a format as carrying a UTC offset.
const OFFSET_TOKEN: &str = "%z";

/// Width of the offset suffix: sign, two hour digits, two minute digits.
const OFFSET_WIDTH: usize = 5;

/// Error returned when a timestamp or delay string cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The value does not match the expected pattern
    #[error("malformed timestamp {value:?} (expected {format:?})")]
    MalformedTimestamp { value: String, format: String },

    /// The format string itself cannot be used
    #[error("invalid timestamp format: {0:?}")]
    InvalidFormat(String),

    /// A delay is not an ISO-8601 time duration such as `PT2M`
    #[error("malformed delay: {0:?}")]
    MalformedDelay(String),
}

/// Result of [`parse_timestamp`].
///
/// Whether the timestamp carries an offset is decided by the format, not
/// the value, so callers that always pass [`API_DATETIME_FORMAT`] can rely
/// on getting [`Timestamp::Aware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Parsed with a trailing UTC offset.
    Aware(DateTime<FixedOffset>),
    /// Parsed without any timezone information.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Returns the timezone-aware instant, if there is one.
    pub fn aware(self) -> Option<DateTime<FixedOffset>> {
        match self {
            Timestamp::Aware(dt) => Some(dt),
            Timestamp::Naive(_) => None,
        }
    }

    /// Returns the wall-clock date and time, dropping any offset.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Aware(dt) => dt.naive_local(),
            Timestamp::Naive(dt) => *dt,
        }
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Aware(dt)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp::Naive(dt)
    }
}

/// Parse a timestamp string against a strftime-style format.
///
/// # Examples
///
/// ```
/// use ns_api::domain::{parse_timestamp, Timestamp};
///
/// let ts = parse_timestamp("2024-03-01T10:15:00+0530", "%Y-%m-%dT%H:%M:%S%z").unwrap();
/// let dt = ts.aware().unwrap();
/// assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
///
/// let naive = parse_timestamp("2024-03-01 10:15", "%Y-%m-%d %H:%M").unwrap();
/// assert!(matches!(naive, Timestamp::Naive(_)));
/// ```
pub fn parse_timestamp(value: &str, format: &str) -> Result<Timestamp, TimeError> {
    let malformed = || TimeError::MalformedTimestamp {
        value: value.to_string(),
        format: format.to_string(),
    };

    let Some(base_format) = format.strip_suffix(OFFSET_TOKEN) else {
        return parse_naive(value, format)
            .map(Timestamp::Naive)
            .map_err(|_| malformed());
    };

    let split = value
        .len()
        .checked_sub(OFFSET_WIDTH)
        .filter(|&idx| value.is_char_boundary(idx))
        .ok_or_else(malformed)?;
    let (local, suffix) = value.split_at(split);

    let offset = parse_offset(suffix).ok_or_else(malformed)?;
    let naive = parse_naive(local, base_format).map_err(|_| malformed())?;
    let aware = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(malformed)?;

    Ok(Timestamp::Aware(aware))
}

/// Parse a naive date and time, filling in whatever the format omits.
///
/// A date-only format yields midnight; a time-only format yields that
/// time on 1900-01-01.
fn parse_naive(value: &str, format: &str) -> ParseResult<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(value, format) {
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {
            match NaiveDate::parse_from_str(value, format) {
                Ok(date) => Ok(date.and_time(NaiveTime::MIN)),
                Err(e) if e.kind() == ParseErrorKind::NotEnough => {
                    NaiveTime::parse_from_str(value, format).map(|time| default_date().and_time(time))
                }
                Err(e) => Err(e),
            }
        }
        parsed => parsed,
    }
}

fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// Parse an API timestamp, which always carries an offset.
pub fn parse_api_datetime(value: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    parse_timestamp(value, API_DATETIME_FORMAT)?
        .aware()
        .ok_or_else(|| TimeError::MalformedTimestamp {
            value: value.to_string(),
            format: API_DATETIME_FORMAT.to_string(),
        })
}

/// Format a timestamp with a strftime-style format.
///
/// Fails only when the format cannot be rendered, which includes asking
/// for an offset (`%z`) from a naive timestamp.
pub fn format_timestamp(value: &Timestamp, format: &str) -> Result<String, TimeError> {
    let mut out = String::new();
    let rendered = match value {
        Timestamp::Aware(dt) => write!(out, "{}", dt.format(format)),
        Timestamp::Naive(dt) => write!(out, "{}", dt.format(format)),
    };
    rendered
        .map(|()| out)
        .map_err(|fmt::Error| TimeError::InvalidFormat(format.to_string()))
}

/// Parse a `+HHMM` / `-HHMM` offset suffix.
fn parse_offset(suffix: &str) -> Option<FixedOffset> {
    let bytes = suffix.as_bytes();
    if bytes.len() != OFFSET_WIDTH {
        return None;
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours = parse_two_digits(&bytes[1..3])?;
    let minutes = parse_two_digits(&bytes[3..5])?;
    if minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_two_digits(bytes: &[u8]) -> Option<i32> {
    match bytes {
        [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
            Some(i32::from(tens - b'0') * 10 + i32::from(ones - b'0'))
        }
        _ => None,
    }
}

/// Parse a departure delay such as `PT2M` or `PT1H5M`.
///
/// Only the time part of an ISO-8601 duration is accepted; the API never
/// reports delays measured in days.
pub fn parse_delay(value: &str) -> Result<Duration, TimeError> {
    let malformed = || TimeError::MalformedDelay(value.to_string());

    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let components = unsigned.strip_prefix("PT").ok_or_else(malformed)?;
    if components.is_empty() {
        return Err(malformed());
    }

    let mut total = Duration::zero();
    let mut start = 0;
    for (idx, c) in components.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let amount: i64 = components[start..idx].parse().map_err(|_| malformed())?;
        let part = match c {
            'H' => Duration::try_hours(amount),
            'M' => Duration::try_minutes(amount),
            'S' => Duration::try_seconds(amount),
            _ => None,
        }
        .ok_or_else(malformed)?;
        total = total + part;
        start = idx + c.len_utf8();
    }

    // Trailing digits without a unit
    if start != components.len() {
        return Err(malformed());
    }

    Ok(if negative { -total } else { total })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn offset_suffix(offset_secs: i32) -> String {
        let sign = if offset_secs < 0 { '-' } else { '+' };
        let abs = offset_secs.abs();
        format!("{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)
    }

    proptest! {
        #[test]
        fn any_offset_roundtrips(
            hours in 0i32..24,
            minutes in 0i32..60,
            negative in any::<bool>(),
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let magnitude = hours * 3600 + minutes * 60;
            let offset_secs = if negative { -magnitude } else { magnitude };
            let input = format!(
                "2024-03-01T{hour:02}:{minute:02}:00{}",
                offset_suffix(offset_secs)
            );

            let ts = parse_timestamp(&input, API_DATETIME_FORMAT).unwrap();
            let dt = ts.aware().unwrap();
            prop_assert_eq!(dt.offset().local_minus_utc(), offset_secs);
            prop_assert_eq!(format_timestamp(&ts, API_DATETIME_FORMAT).unwrap(), input);
        }
    }
}
