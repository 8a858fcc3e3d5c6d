//! Data types for the release feed pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One listing row as a source adapter scraped it, before any
/// interpretation. Field contents are site-specific text; the normalizer
/// owns validation and repair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub size: String,
    pub quality: String,
    pub published: String,
}

/// Canonical release entry, the unit of the feed contract.
///
/// Every field is present on any entry that leaves the normalizer. On the
/// wire all six fields are strings; `date` serializes as RFC 3339 with an
/// explicit UTC offset so the dashboard can feed it straight to
/// `new Date()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseEntry {
    pub title: String,
    pub url: String,
    pub size: String,
    pub quality: String,
    #[serde(with = "wire_date")]
    pub date: DateTime<Utc>,
    pub source: String,
}

mod wire_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
