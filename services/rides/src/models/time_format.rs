//! Ride times are written `HH:MM` and read as `HH:MM` or `HH:MM:SS`

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

const OUTPUT_FORMAT: &str = "%H:%M";

/// Parse `HH:MM:SS` or `HH:MM`
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&time.format(OUTPUT_FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid time `{}`, expected HH:MM", raw)))
}

/// Same format for optional fields; use with `#[serde(default)]`
pub mod option {
    use super::*;

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => super::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_time(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid time `{}`, expected HH:MM", raw))
            }),
            None => Ok(None),
        }
    }
}
