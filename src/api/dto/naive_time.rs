//! Lenient parsing of offset-free timestamps.
//!
//! Accepts `2030-01-01T10:00:00`, fractional seconds, minute precision
//! (`2030-01-01T10:00`) and a space instead of `T`.

use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::domain::Patch;

const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses one timestamp in any accepted layout.
///
/// # Errors
///
/// Returns a message naming the rejected input.
pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("`{raw}` is not a date-time like 2030-01-01T10:00"))
}

/// `deserialize_with` target for required timestamp fields.
///
/// # Errors
///
/// Propagates a custom serde error for unparseable input.
pub fn required<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(D::Error::custom)
}

/// `deserialize_with` target for [`Patch`] timestamp fields; pair it with
/// `#[serde(default)]`.
///
/// # Errors
///
/// Propagates a custom serde error for unparseable input.
pub fn patch<'de, D>(deserializer: D) -> Result<Patch<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Patch::Null),
        Some(raw) => parse(&raw).map(Patch::Value).map_err(D::Error::custom),
    }
}
