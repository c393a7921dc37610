//! Durations as operators type them: `2`, `1.5`, `90m`, `1h30m`, `45s`, `open`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `1h30m`, `90m`, `45s`, `2h` and combinations in h-m-s order.
static UNIT_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("static regex is valid")
});

/// Bare hours, possibly fractional: `2`, `1.5`.
static DECIMAL_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("static regex is valid"));

/// Upper bound on any parsed duration (one week).
pub const MAX_DURATION_SECONDS: u64 = 7 * 24 * 3_600;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    #[error("invalid duration: {0:?} (use e.g. 2, 1.5, 90m, 1h30m)")]
    Invalid(String),

    #[error("duration must be greater than zero")]
    Zero,

    #[error("duration too long: {0:?}")]
    TooLong(String),
}

/// Parses a duration string into whole seconds.
///
/// Bare numbers are hours. Fractional hours are rounded to the nearest second.
pub fn parse_seconds(input: &str) -> Result<u64, ParseDurationError> {
    let s = input.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err(ParseDurationError::Invalid(input.to_string()));
    }

    let seconds = if DECIMAL_HOURS_RE.is_match(&s) {
        let hours: f64 = s
            .parse()
            .map_err(|_| ParseDurationError::Invalid(input.to_string()))?;
        if hours * 3_600.0 > MAX_DURATION_SECONDS as f64 {
            return Err(ParseDurationError::TooLong(input.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = (hours * 3_600.0).round() as u64;
        seconds
    } else {
        let Some(caps) = UNIT_DURATION_RE.captures(&s) else {
            return Err(ParseDurationError::Invalid(input.to_string()));
        };
        let mut total: u64 = 0;
        for (index, unit) in [(1, 3_600), (2, 60), (3, 1)] {
            if let Some(m) = caps.get(index) {
                let n: u64 = m
                    .as_str()
                    .parse()
                    .map_err(|_| ParseDurationError::TooLong(input.to_string()))?;
                total = n
                    .checked_mul(unit)
                    .and_then(|v| total.checked_add(v))
                    .ok_or_else(|| ParseDurationError::TooLong(input.to_string()))?;
            }
        }
        total
    };

    if seconds > MAX_DURATION_SECONDS {
        return Err(ParseDurationError::TooLong(input.to_string()));
    }
    if seconds == 0 {
        return Err(ParseDurationError::Zero);
    }
    Ok(seconds)
}

/// Compact human form: `2h`, `1h30m`, `45m`, `1m30s`, `0s`.
pub fn format_span(seconds: u64) -> String {
    let hours = seconds / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if secs > 0 || out.is_empty() {
        out.push_str(&format!("{secs}s"));
    }
    out
}

/// `HH:MM:SS` countdown/stopwatch display. Hours are not wrapped at 24.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Length of a table booking, minute precision.
///
/// Serialized as (possibly fractional) hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BookingLength {
    minutes: u32,
}

impl BookingLength {
    /// Creates a length from minutes. Zero is rejected.
    pub const fn from_minutes(minutes: u32) -> Result<Self, ParseDurationError> {
        if minutes == 0 {
            return Err(ParseDurationError::Zero);
        }
        Ok(Self { minutes })
    }

    /// Creates a length of whole hours.
    pub const fn from_hours(hours: u32) -> Result<Self, ParseDurationError> {
        Self::from_minutes(hours * 60)
    }

    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub fn to_duration(self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.minutes))
    }

    #[must_use]
    pub fn hours(self) -> f64 {
        f64::from(self.minutes) / 60.0
    }
}

impl TryFrom<f64> for BookingLength {
    type Error = ParseDurationError;

    fn try_from(hours: f64) -> Result<Self, Self::Error> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ParseDurationError::Zero);
        }
        let minutes = (hours * 60.0).round();
        if minutes > (MAX_DURATION_SECONDS / 60) as f64 {
            return Err(ParseDurationError::TooLong(hours.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes = minutes as u32;
        Self::from_minutes(minutes)
    }
}

impl From<BookingLength> for f64 {
    fn from(length: BookingLength) -> Self {
        length.hours()
    }
}

impl FromStr for BookingLength {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = parse_seconds(s)?;
        // minute precision: round to the nearest minute, but never down to zero
        let minutes = u32::try_from(((seconds + 30) / 60).max(1))
            .map_err(|_| ParseDurationError::TooLong(s.to_string()))?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for BookingLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_span(u64::from(self.minutes) * 60))
    }
}

/// Duration chosen by the operator before switching a console on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDuration {
    /// Countdown of this many seconds, then auto-stop.
    Fixed { seconds: u64 },
    /// No end time; runs until stopped manually.
    Open,
}

impl SessionDuration {
    pub const fn hours(hours: u64) -> Self {
        Self::Fixed {
            seconds: hours * 3_600,
        }
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self::Fixed {
            seconds: minutes * 60,
        }
    }
}

impl FromStr for SessionDuration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("open") {
            return Ok(Self::Open);
        }
        parse_seconds(s).map(|seconds| Self::Fixed { seconds })
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { seconds } => f.write_str(&format_span(*seconds)),
            Self::Open => f.write_str("open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numbers_are_hours() {
        assert_eq!(parse_seconds("2").unwrap(), 7_200);
        assert_eq!(parse_seconds("1.5").unwrap(), 5_400);
    }

    #[test]
    fn unit_suffixes_combine() {
        assert_eq!(parse_seconds("90m").unwrap(), 5_400);
        assert_eq!(parse_seconds("1h30m").unwrap(), 5_400);
        assert_eq!(parse_seconds("45s").unwrap(), 45);
        assert_eq!(parse_seconds("1H").unwrap(), 3_600);
    }

    #[test]
    fn invalid_and_zero_durations_rejected() {
        assert!(matches!(
            parse_seconds("soon"),
            Err(ParseDurationError::Invalid(_))
        ));
        assert!(matches!(parse_seconds(""), Err(ParseDurationError::Invalid(_))));
        assert_eq!(parse_seconds("0"), Err(ParseDurationError::Zero));
        assert_eq!(parse_seconds("0m"), Err(ParseDurationError::Zero));
    }

    #[test]
    fn absurd_durations_rejected() {
        assert!(matches!(
            parse_seconds("1000h"),
            Err(ParseDurationError::TooLong(_))
        ));
        assert!(matches!(
            parse_seconds("99999999999999999999m"),
            Err(ParseDurationError::TooLong(_))
        ));
    }

    #[test]
    fn format_span_is_compact() {
        assert_eq!(format_span(7_200), "2h");
        assert_eq!(format_span(5_400), "1h30m");
        assert_eq!(format_span(60), "1m");
        assert_eq!(format_span(90), "1m30s");
        assert_eq!(format_span(0), "0s");
    }

    #[test]
    fn format_clock_pads_fields() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_599), "00:59:59");
        assert_eq!(format_clock(3_600 * 25 + 61), "25:01:01");
    }

    #[test]
    fn booking_length_parses_and_displays() {
        let length: BookingLength = "1.5".parse().unwrap();
        assert_eq!(length.minutes(), 90);
        assert_eq!(length.to_string(), "1h30m");
        assert_eq!("2".parse::<BookingLength>().unwrap().to_string(), "2h");
    }

    #[test]
    fn booking_length_serializes_as_hours() {
        let length = BookingLength::from_minutes(90).unwrap();
        assert_eq!(serde_json::to_string(&length).unwrap(), "1.5");
        let parsed: BookingLength = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, BookingLength::from_hours(2).unwrap());
    }

    #[test]
    fn booking_length_rejects_non_positive_hours() {
        assert!(serde_json::from_str::<BookingLength>("0").is_err());
        assert!(serde_json::from_str::<BookingLength>("-1").is_err());
    }

    #[test]
    fn session_duration_accepts_open_and_fractions() {
        assert_eq!("open".parse::<SessionDuration>().unwrap(), SessionDuration::Open);
        assert_eq!(
            "1m".parse::<SessionDuration>().unwrap(),
            SessionDuration::minutes(1)
        );
        assert_eq!(
            "3".parse::<SessionDuration>().unwrap(),
            SessionDuration::hours(3)
        );
        assert_eq!(SessionDuration::hours(3).to_string(), "3h");
        assert_eq!(SessionDuration::Open.to_string(), "open");
    }
}
