//! End-to-end aggregation over scripted sources: partial failure policy,
//! cross-source dedup, ordering, and the empty-snapshot rule.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use shinbun_core::{AggregateResult, FetchError, ReleaseSource};

use crate::support::{StubSource, aggregator, raw};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 26, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn partial_failure_still_yields_the_success_shape() {
    let sources: Vec<Arc<dyn ReleaseSource>> = vec![
        Arc::new(StubSource::failing(
            "a",
            FetchError::Network {
                reason: "dns failure".to_string(),
            },
        )),
        Arc::new(StubSource::ok(
            "b",
            vec![raw(
                "Show X - Ep 1",
                "magnet:?xt=urn:btih:abc",
                "2025-10-26 10:00",
            )],
        )),
    ];

    match aggregator(sources).refresh_at(now()).await {
        AggregateResult::NonEmpty(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].source, "b");
        }
        AggregateResult::Empty => panic!("one healthy source must be enough"),
    }
}

#[tokio::test]
async fn timeouts_and_parse_failures_all_collapse_to_empty() {
    let sources: Vec<Arc<dyn ReleaseSource>> = vec![
        Arc::new(StubSource::ok("a", vec![]).slow(Duration::from_secs(10))),
        Arc::new(StubSource::failing(
            "b",
            FetchError::Parse {
                reason: "table is gone".to_string(),
            },
        )),
    ];

    assert_eq!(
        aggregator(sources).refresh_at(now()).await,
        AggregateResult::Empty
    );
}

#[tokio::test]
async fn case_variant_duplicate_across_sources_keeps_the_priority_entry() {
    // The lower-priority source reports the same episode earlier in the
    // day under a case/space variant of the title.
    let sources: Vec<Arc<dyn ReleaseSource>> = vec![
        Arc::new(StubSource::ok(
            "b",
            vec![raw(
                "show x - ep 1",
                "https://b/release/1",
                "2025-10-26 09:00",
            )],
        )),
        Arc::new(StubSource::ok(
            "a",
            vec![raw(
                "Show X - Ep 1",
                "https://a/release/1",
                "2025-10-26 10:00",
            )],
        )),
    ];

    match aggregator(sources).refresh_at(now()).await {
        AggregateResult::NonEmpty(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].source, "a");
            assert_eq!(entries[0].title, "Show X - Ep 1");
        }
        AggregateResult::Empty => panic!("expected one surviving duplicate"),
    }
}

#[tokio::test]
async fn pooled_output_is_date_sorted_across_sources() {
    let sources: Vec<Arc<dyn ReleaseSource>> = vec![
        Arc::new(StubSource::ok(
            "a",
            vec![
                raw("Early Show - Ep 3", "https://a/1", "2025-10-26 06:00"),
                raw("Late Show - Ep 9", "https://a/2", "2025-10-26 11:45"),
            ],
        )),
        Arc::new(StubSource::ok(
            "b",
            vec![raw("Mid Show - Ep 5", "https://b/1", "2025-10-26 09:30")],
        )),
    ];

    match aggregator(sources).refresh_at(now()).await {
        AggregateResult::NonEmpty(entries) => {
            assert_eq!(entries.len(), 3);
            assert!(
                entries.windows(2).all(|pair| pair[0].date >= pair[1].date),
                "dates must be non-increasing"
            );
            assert_eq!(entries[0].title, "Late Show - Ep 9");
            assert_eq!(entries[2].title, "Early Show - Ep 3");
        }
        AggregateResult::Empty => panic!("expected three entries"),
    }
}

#[tokio::test]
async fn entries_failing_normalization_are_silently_dropped() {
    let sources: Vec<Arc<dyn ReleaseSource>> = vec![Arc::new(StubSource::ok(
        "a",
        vec![
            raw("", "https://a/1", "2025-10-26 10:00"),
            raw("Relative Link", "view/1234", "2025-10-26 10:00"),
            raw("From The Future", "https://a/2", "2025-10-28 23:00"),
            raw("Kept - Ep 1", "https://a/3", "2025-10-26 10:00"),
        ],
    ))];

    match aggregator(sources).refresh_at(now()).await {
        AggregateResult::NonEmpty(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].title, "Kept - Ep 1");
        }
        AggregateResult::Empty => panic!("the valid entry should survive"),
    }
}
