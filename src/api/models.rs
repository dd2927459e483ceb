use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the feed, e.g. `2024-05-01 08:00:00Z`.
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

/// One entry of the events feed, exactly as published upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(with = "feed_timestamp")]
    pub begin: DateTime<Utc>,
    #[serde(with = "feed_timestamp")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub special: bool,
    #[serde(rename = "pvp", default)]
    pub is_pvp: bool,
    #[serde(default)]
    pub url: String,
}

impl RawEvent {
    pub fn has_valid_range(&self) -> bool {
        self.begin <= self.end
    }
}

pub mod feed_timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    /// Parse a feed timestamp, accepting RFC 3339 as a fallback.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, FEED_TIMESTAMP_FORMAT) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FEED_TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unparsable timestamp `{}`", raw)))
    }
}
