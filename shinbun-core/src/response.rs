//! Wire encoding of an aggregation result.
//!
//! The dashboard's contract is shape-based: a JSON array means releases,
//! an object with an `error` field means nothing to show. Both ride
//! HTTP 200; transport status never carries the distinction.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateResult;
use crate::types::ReleaseEntry;

/// Message served when a snapshot comes back empty.
pub const NO_RELEASES_MESSAGE: &str = "No new anime releases today.";

/// The two payload shapes the dashboard understands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WireResponse {
    /// Success: the canonical entries, already in feed order.
    Releases(Vec<ReleaseEntry>),
    /// Soft failure: nothing to show, reason in the `error` field.
    Error {
        /// Human-readable explanation for the dashboard to display
        error: String,
    },
}

/// Maps an aggregation result onto the wire contract.
pub fn encode(result: AggregateResult) -> WireResponse {
    match result {
        AggregateResult::NonEmpty(entries) => WireResponse::Releases(entries),
        AggregateResult::Empty => WireResponse::Error {
            error: NO_RELEASES_MESSAGE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn entry() -> ReleaseEntry {
        ReleaseEntry {
            title: "Show X - Ep 1".to_string(),
            url: "magnet:?xt=urn:btih:abc".to_string(),
            size: "1.23 GB".to_string(),
            quality: "1080p".to_string(),
            date: Utc.with_ymd_and_hms(2025, 10, 26, 10, 0, 0).unwrap(),
            source: "comicat.org".to_string(),
        }
    }

    #[test]
    fn releases_serialize_as_a_plain_array() {
        let wire = encode(AggregateResult::NonEmpty(vec![entry()]));
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(
            value,
            json!([{
                "title": "Show X - Ep 1",
                "url": "magnet:?xt=urn:btih:abc",
                "size": "1.23 GB",
                "quality": "1080p",
                "date": "2025-10-26T10:00:00+00:00",
                "source": "comicat.org"
            }])
        );
    }

    #[test]
    fn empty_result_serializes_as_the_error_object() {
        let wire = encode(AggregateResult::Empty);
        let value = serde_json::to_value(&wire).unwrap();

        assert_eq!(value, json!({ "error": "No new anime releases today." }));
    }

    #[test]
    fn an_empty_snapshot_is_never_an_empty_array() {
        let value = serde_json::to_value(encode(AggregateResult::Empty)).unwrap();
        assert!(value.is_object());
    }
}
