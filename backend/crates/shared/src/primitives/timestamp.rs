use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use super::PrimitiveAdapter;
use crate::error::decode::DecodeError;

/// Naive layouts that are recognised only to be rejected as ambiguous.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 0000-01-01T00:00:00.000Z
pub const MIN_MILLIS: i64 = -62_167_219_200_000;
/// 9999-12-31T23:59:59.999Z
pub const MAX_MILLIS: i64 = 253_402_300_799_999;

/// UTC instant with millisecond precision.
///
/// Sub-millisecond parts are truncated at construction, which is the
/// precision of the storage form, so every conversion round-trips exactly.
/// Years are limited to 0000..=9999, the range of the RFC 3339 wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// `None` outside years 0000..=9999.
    pub fn from_datetime(value: DateTime<Utc>) -> Option<Self> {
        Self::from_millis(value.timestamp_millis())
    }

    /// `None` outside years 0000..=9999.
    pub fn from_millis(millis: i64) -> Option<Self> {
        if !(MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis(millis).map(Self)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl PrimitiveAdapter for Timestamp {
    type Storage = bson::DateTime;

    fn to_storage(&self) -> bson::DateTime {
        bson::DateTime::from_millis(self.timestamp_millis())
    }

    fn from_storage(raw: bson::DateTime) -> Result<Self, DecodeError> {
        Self::from_millis(raw.timestamp_millis()).ok_or_else(|| {
            DecodeError::MalformedTimestamp {
                input: raw.timestamp_millis().to_string(),
            }
        })
    }

    fn to_wire(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Accepts any RFC 3339 text with an explicit offset and converts it to
    /// UTC. Naive date-times are rejected as ambiguous.
    fn from_wire(text: &str) -> Result<Self, DecodeError> {
        let text = text.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            // an offset can push a boundary instant out of range
            return Self::from_datetime(parsed.with_timezone(&Utc)).ok_or_else(|| {
                DecodeError::MalformedTimestamp {
                    input: text.to_string(),
                }
            });
        }

        let naive = NAIVE_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
            || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok();
        if naive {
            Err(DecodeError::AmbiguousTimestamp {
                input: text.to_string(),
            })
        } else {
            Err(DecodeError::MalformedTimestamp {
                input: text.to_string(),
            })
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = DecodeError;

    fn try_from(value: DateTime<Utc>) -> Result<Self, Self::Error> {
        Self::from_datetime(value).ok_or_else(|| DecodeError::MalformedTimestamp {
            input: value.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}
