//! Stored timestamps.
//!
//! New timestamps are written as RFC 3339 in UTC. Reading also accepts naive
//! `YYYY-MM-DDTHH:MM:SS[.f]` strings, which are taken as local time, so
//! files produced by earlier tooling keep loading. Whatever was read is
//! written back verbatim: history written by other tools is never reformatted.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a stored timestamp string.
///
/// # Example
///
/// ```
/// use ralph_ledger::timestamp::parse;
///
/// assert!(parse("2025-01-12T10:00:00Z").is_some());
/// assert!(parse("2025-01-12T10:00:00.123456").is_some());
/// assert!(parse("yesterday").is_none());
/// ```
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Minute-resolution local rendering used by the report and console.
#[must_use]
pub fn to_minutes(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// A timestamp field as found on disk.
///
/// # Example
///
/// ```
/// use ralph_ledger::timestamp::Timestamp;
///
/// let ts: Timestamp = serde_json::from_str("\"2025-01-10 09:00:00\"").unwrap();
/// assert!(ts.at().is_none());
/// assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2025-01-10 09:00:00\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// A recognized time, with the text it was read from
    Parsed { at: DateTime<Utc>, raw: String },
    /// Anything unrecognized, kept as-is
    Raw(Value),
}

impl Timestamp {
    /// The instant, when the stored value could be parsed.
    #[must_use]
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Parsed { at, .. } => Some(*at),
            Timestamp::Raw(_) => None,
        }
    }

    /// Minute-resolution rendering. Unparsed strings show their first
    /// 16 characters.
    #[must_use]
    pub fn minutes(&self) -> String {
        match self {
            Timestamp::Parsed { at, .. } => to_minutes(at),
            Timestamp::Raw(Value::String(s)) => s.chars().take(16).collect(),
            Timestamp::Raw(other) => other.to_string(),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::Parsed {
            at,
            raw: at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Timestamp::Parsed { raw, .. } => serializer.serialize_str(raw),
            Timestamp::Raw(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = value.as_str().and_then(|s| parse(s).map(|at| (at, s)));
        Ok(match parsed {
            Some((at, raw)) => Timestamp::Parsed {
                at,
                raw: raw.to_string(),
            },
            None => Timestamp::Raw(value),
        })
    }
}
