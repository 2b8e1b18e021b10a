//! Serde for `Claims.Timestamp`.
//!
//! Timestamps go out as `2025-03-05 10:00:00`, the form every table read
//! uses. Both that form and ISO `2025-03-05T10:00:00` are read back, with
//! optional fractional seconds.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn parse(value: &str) -> Option<NaiveDateTime> {
    ACCEPTED
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid timestamp: {}", value))
        }),
        None => Ok(None),
    }
}
