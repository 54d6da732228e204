//! Typed scalar values and coercion from user input.
//!
//! Every editable leaf of a usage event is a [`Scalar`]. User-typed strings
//! are coerced into the leaf's existing kind, so an edit can never leave a
//! number field holding text.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// A typed leaf value within a usage event.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Free-form text.
    Text(String),
    /// A decimal number.
    Number(f64),
    /// A UTC timestamp.
    Timestamp(DateTime<Utc>),
}

/// The kind of a [`Scalar`], used to pick the coercion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Free-form text.
    Text,
    /// A decimal number.
    Number,
    /// A UTC timestamp.
    Timestamp,
}

/// A user-typed value could not be coerced to the field's kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    /// The input is not a decimal number.
    #[error("not a number: {input:?}")]
    InvalidNumber {
        /// The rejected input.
        input: String,
    },

    /// The input is not a recognized timestamp.
    #[error("not a timestamp (expected RFC 3339 or YYYY-MM-DD): {input:?}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
    },
}

impl Scalar {
    /// The kind of this scalar.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Text(_) => ScalarKind::Text,
            Self::Number(_) => ScalarKind::Number,
            Self::Timestamp(_) => ScalarKind::Timestamp,
        }
    }

    /// Coerce a raw user-typed string into a scalar of the given kind.
    ///
    /// Numbers parse as decimal. Timestamps accept RFC 3339, a naive
    /// `YYYY-MM-DDTHH:MM:SS` (assumed UTC), or a bare date which expands to
    /// midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] naming the rejected input when it does
    /// not parse as the requested kind.
    pub fn parse(raw: &str, kind: ScalarKind) -> Result<Self, CoercionError> {
        let raw = raw.trim();
        match kind {
            ScalarKind::Text => Ok(Self::Text(raw.to_string())),
            ScalarKind::Number => raw
                .parse::<f64>()
                .map(Self::Number)
                .map_err(|_| CoercionError::InvalidNumber {
                    input: raw.to_string(),
                }),
            ScalarKind::Timestamp => parse_timestamp(raw).map(Self::Timestamp),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Timestamp(t) => f.write_str(&format_timestamp(*t)),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Timestamp => "timestamp",
        })
    }
}

/// Parse a timestamp from user input.
///
/// # Errors
///
/// Returns [`CoercionError::InvalidTimestamp`] when no accepted format
/// matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoercionError> {
    if let Ok(full) = DateTime::parse_from_rfc3339(raw) {
        return Ok(full.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(CoercionError::InvalidTimestamp {
        input: raw.to_string(),
    })
}

/// Render a timestamp the way the API and the editor display it.
#[must_use]
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn number_parses_decimal() {
        assert_eq!(
            Scalar::parse("100.5", ScalarKind::Number),
            Ok(Scalar::Number(100.5))
        );
        assert_eq!(
            Scalar::parse("-3", ScalarKind::Number),
            Ok(Scalar::Number(-3.0))
        );
    }

    #[test]
    fn non_numeric_input_fails_for_number() {
        let err = Scalar::parse("abc", ScalarKind::Number).unwrap_err();
        assert_eq!(
            err,
            CoercionError::InvalidNumber {
                input: "abc".to_string()
            }
        );
    }

    #[test]
    fn timestamp_accepts_rfc3339() {
        let parsed = Scalar::parse("2025-06-01T12:00:00Z", ScalarKind::Timestamp).unwrap();
        assert_eq!(
            parsed,
            Scalar::Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn timestamp_accepts_naive_datetime_as_utc() {
        let parsed = Scalar::parse("2025-06-01T08:30:00", ScalarKind::Timestamp).unwrap();
        assert_eq!(
            parsed,
            Scalar::Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn date_only_expands_to_midnight_utc() {
        let parsed = Scalar::parse("2025-06-01", ScalarKind::Timestamp).unwrap();
        assert_eq!(
            parsed,
            Scalar::Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        assert!(Scalar::parse("next tuesday", ScalarKind::Timestamp).is_err());
    }

    #[test]
    fn scalar_roundtrips_through_display() {
        let values = [
            Scalar::Text("org/acme".to_string()),
            Scalar::Number(1500.0),
            Scalar::Number(2.5),
            Scalar::Number(-0.25),
            Scalar::Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        ];
        for value in values {
            let rendered = value.to_string();
            let reparsed = Scalar::parse(&rendered, value.kind()).unwrap();
            assert_eq!(reparsed, value, "{rendered}");
        }
    }
}
