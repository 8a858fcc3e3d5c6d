//! Fan-out orchestration across sources and the snapshot policy.
//!
//! Every aggregation pass fans out one task per source, bounded by a
//! semaphore and two time budgets, then folds whatever survived into one
//! deterministic, deduplicated, date-sorted sequence. Source failures are
//! logged and absorbed here; the only caller-visible degradation is an
//! empty result.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout, timeout_at};

use crate::config::{FetchConfig, ShinbunConfig};
use crate::dedupe::{SourcePriority, dedupe};
use crate::errors::FetchError;
use crate::normalize::{SourceContext, normalize_entry};
use crate::sources::{
    AnimeToshoSource, ComicatSource, DmhySource, FetchOutcome, ReleaseSource,
};
use crate::types::ReleaseEntry;

/// Final shape of one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateResult {
    /// At least one release survived normalization and dedup, sorted most
    /// recent first.
    NonEmpty(Vec<ReleaseEntry>),
    /// Nothing survived, whether sources failed or truthfully had nothing
    /// new.
    Empty,
}

/// Orchestrates the fetch fan-out and owns the snapshot policy.
#[derive(Debug)]
pub struct FeedAggregator {
    sources: Vec<Arc<dyn ReleaseSource>>,
    fetch: FetchConfig,
    priority: SourcePriority,
}

impl FeedAggregator {
    /// Builds the production source set from configuration, sharing one
    /// HTTP client across adapters.
    pub fn from_config(config: &ShinbunConfig, client: reqwest::Client) -> Self {
        let sources: Vec<Arc<dyn ReleaseSource>> = vec![
            Arc::new(ComicatSource::new(client.clone(), &config.sources)),
            Arc::new(DmhySource::new(client.clone(), &config.sources)),
            Arc::new(AnimeToshoSource::new(client, &config.sources)),
        ];
        Self::with_sources(
            sources,
            config.fetch.clone(),
            SourcePriority::new(config.sources.priority.clone()),
        )
    }

    /// Builds an aggregator over an explicit source set.
    pub fn with_sources(
        sources: Vec<Arc<dyn ReleaseSource>>,
        fetch: FetchConfig,
        priority: SourcePriority,
    ) -> Self {
        Self {
            sources,
            fetch,
            priority,
        }
    }

    /// Computes one fresh snapshot.
    pub async fn refresh(&self) -> AggregateResult {
        self.refresh_at(Utc::now()).await
    }

    /// Snapshot with an explicit aggregation instant, for tests.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> AggregateResult {
        let pooled = self.fetch_and_normalize(now).await;

        let mut entries = dedupe(pooled, &self.priority);
        entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.title.cmp(&b.title))
        });

        if entries.is_empty() {
            AggregateResult::Empty
        } else {
            AggregateResult::NonEmpty(entries)
        }
    }

    async fn fetch_and_normalize(&self, now: DateTime<Utc>) -> Vec<ReleaseEntry> {
        let limit = Arc::new(Semaphore::new(self.fetch.max_concurrent_fetches.max(1)));
        let mut tasks: JoinSet<(String, FixedOffset, FetchOutcome)> = JoinSet::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let limit = Arc::clone(&limit);
            let budget = self.fetch.per_source_timeout;
            tasks.spawn(async move {
                let label = source.label().to_string();
                let offset = source.utc_offset();
                let _permit = match limit.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            label,
                            offset,
                            Err(FetchError::Network {
                                reason: "fetch limiter closed".to_string(),
                            }),
                        );
                    }
                };
                let outcome = match timeout(budget, source.fetch_releases()).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout),
                };
                (label, offset, outcome)
            });
        }

        let deadline = Instant::now() + self.fetch.overall_timeout;
        let mut pooled = Vec::new();

        loop {
            let joined = timeout_at(deadline, tasks.join_next()).await;
            let joined = match joined {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        abandoned = tasks.len(),
                        "aggregation budget elapsed, abandoning pending sources"
                    );
                    tasks.abort_all();
                    break;
                }
            };
            let Some(joined) = joined else { break };

            match joined {
                Ok((label, offset, Ok(raw_entries))) => {
                    let ctx = SourceContext {
                        label: label.clone(),
                        utc_offset: offset,
                        now,
                    };
                    let total = raw_entries.len();
                    let mut kept = 0usize;
                    for raw in raw_entries {
                        match normalize_entry(raw, &ctx) {
                            Ok(entry) => {
                                kept += 1;
                                pooled.push(entry);
                            }
                            Err(reason) => {
                                tracing::debug!(source = %label, %reason, "dropped entry");
                            }
                        }
                    }
                    tracing::debug!(source = %label, total, kept, "source fetched");
                }
                Ok((label, _, Err(error))) => {
                    tracing::warn!(source = %label, %error, "source fetch failed");
                }
                Err(join_error) => {
                    tracing::warn!(%join_error, "source task aborted");
                }
            }
        }

        tracing::info!(
            pooled = pooled.len(),
            sources = self.sources.len(),
            "fan-out complete"
        );
        pooled
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::sources::MockSource;
    use crate::types::RawEntry;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 26, 12, 0, 0).unwrap()
    }

    fn fast_fetch() -> FetchConfig {
        FetchConfig {
            per_source_timeout: Duration::from_millis(100),
            overall_timeout: Duration::from_millis(300),
            ..FetchConfig::default()
        }
    }

    fn priority() -> SourcePriority {
        SourcePriority::new(vec!["a".to_string(), "b".to_string()])
    }

    fn raw(title: &str, link: &str, published: &str) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            link: link.to_string(),
            size: "1.2 GB".to_string(),
            quality: "1080p".to_string(),
            published: published.to_string(),
        }
    }

    fn aggregator(sources: Vec<Arc<dyn ReleaseSource>>) -> FeedAggregator {
        FeedAggregator::with_sources(sources, fast_fetch(), priority())
    }

    #[tokio::test]
    async fn one_failing_source_does_not_sink_the_rest() {
        let agg = aggregator(vec![
            Arc::new(MockSource::failing(
                "a",
                FetchError::Network {
                    reason: "connection refused".to_string(),
                },
            )),
            Arc::new(MockSource::ok(
                "b",
                vec![raw("Show X - Ep 1", "https://b/1", "2025-10-26 10:00")],
            )),
        ]);

        match agg.refresh_at(now()).await {
            AggregateResult::NonEmpty(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].source, "b");
            }
            AggregateResult::Empty => panic!("expected entries from the healthy source"),
        }
    }

    #[tokio::test]
    async fn all_sources_failing_is_a_soft_empty() {
        let agg = aggregator(vec![
            Arc::new(MockSource::failing(
                "a",
                FetchError::Parse {
                    reason: "layout changed".to_string(),
                },
            )),
            Arc::new(MockSource::failing("b", FetchError::Timeout)),
        ]);

        assert_eq!(agg.refresh_at(now()).await, AggregateResult::Empty);
    }

    #[tokio::test]
    async fn all_sources_empty_is_also_empty() {
        let agg = aggregator(vec![
            Arc::new(MockSource::ok("a", vec![])),
            Arc::new(MockSource::ok("b", vec![])),
        ]);

        assert_eq!(agg.refresh_at(now()).await, AggregateResult::Empty);
    }

    #[tokio::test]
    async fn slow_source_is_timed_out_and_skipped() {
        let agg = aggregator(vec![
            Arc::new(
                MockSource::ok(
                    "a",
                    vec![raw("Never Seen - Ep 1", "https://a/1", "2025-10-26 10:00")],
                )
                .slow(Duration::from_secs(5)),
            ),
            Arc::new(MockSource::ok(
                "b",
                vec![raw("Show X - Ep 1", "https://b/1", "2025-10-26 10:00")],
            )),
        ]);

        match agg.refresh_at(now()).await {
            AggregateResult::NonEmpty(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].source, "b");
            }
            AggregateResult::Empty => panic!("healthy source should survive the timeout"),
        }
    }

    #[tokio::test]
    async fn both_sources_timing_out_yields_empty_without_panicking() {
        let agg = aggregator(vec![
            Arc::new(MockSource::ok("a", vec![]).slow(Duration::from_secs(5))),
            Arc::new(MockSource::ok("b", vec![]).slow(Duration::from_secs(5))),
        ]);

        assert_eq!(agg.refresh_at(now()).await, AggregateResult::Empty);
    }

    #[tokio::test]
    async fn rejected_entries_never_reach_the_output() {
        let agg = aggregator(vec![Arc::new(MockSource::ok(
            "a",
            vec![
                raw("", "https://a/1", "2025-10-26 10:00"),
                raw("No Url", "not-a-url", "2025-10-26 10:00"),
                raw("Bad Date", "https://a/2", "someday"),
                raw("Kept - Ep 1", "https://a/3", "2025-10-26 10:00"),
            ],
        ))]);

        match agg.refresh_at(now()).await {
            AggregateResult::NonEmpty(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].title, "Kept - Ep 1");
            }
            AggregateResult::Empty => panic!("the valid entry should survive"),
        }
    }

    #[tokio::test]
    async fn output_is_sorted_most_recent_first() {
        let agg = aggregator(vec![
            Arc::new(MockSource::ok(
                "a",
                vec![
                    raw("Older - Ep 1", "https://a/1", "2025-10-26 08:00"),
                    raw("Newest - Ep 1", "https://a/2", "2025-10-26 11:30"),
                ],
            )),
            Arc::new(MockSource::ok(
                "b",
                vec![raw("Middle - Ep 1", "https://b/1", "2025-10-26 10:00")],
            )),
        ]);

        match agg.refresh_at(now()).await {
            AggregateResult::NonEmpty(entries) => {
                let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
                let mut sorted = dates.clone();
                sorted.sort_by(|a, b| b.cmp(a));
                assert_eq!(dates, sorted);
                assert_eq!(entries[0].title, "Newest - Ep 1");
            }
            AggregateResult::Empty => panic!("expected three entries"),
        }
    }

    #[tokio::test]
    async fn cross_source_duplicate_keeps_the_priority_source() {
        let agg = aggregator(vec![
            Arc::new(MockSource::ok(
                "b",
                vec![raw("show x - ep 1", "https://b/1", "2025-10-26 09:00")],
            )),
            Arc::new(MockSource::ok(
                "a",
                vec![raw("Show X - Ep 1", "https://a/1", "2025-10-26 10:00")],
            )),
        ]);

        match agg.refresh_at(now()).await {
            AggregateResult::NonEmpty(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].source, "a");
                assert_eq!(entries[0].title, "Show X - Ep 1");
            }
            AggregateResult::Empty => panic!("expected the surviving duplicate"),
        }
    }
}
