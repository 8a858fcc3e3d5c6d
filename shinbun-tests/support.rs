//! Shared fixtures for the integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shinbun_core::config::FetchConfig;
use shinbun_core::sources::FetchOutcome;
use shinbun_core::{FeedAggregator, FetchError, RawEntry, ReleaseSource, SourcePriority};

/// Scripted source used in place of real site adapters.
#[derive(Debug)]
pub struct StubSource {
    label: &'static str,
    delay: Duration,
    outcome: Result<Vec<RawEntry>, FetchError>,
}

impl StubSource {
    pub fn ok(label: &'static str, entries: Vec<RawEntry>) -> Self {
        Self {
            label,
            delay: Duration::ZERO,
            outcome: Ok(entries),
        }
    }

    pub fn failing(label: &'static str, error: FetchError) -> Self {
        Self {
            label,
            delay: Duration::ZERO,
            outcome: Err(error),
        }
    }

    pub fn slow(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

#[async_trait]
impl ReleaseSource for StubSource {
    fn label(&self) -> &str {
        self.label
    }

    async fn fetch_releases(&self) -> FetchOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// Raw entry with sane defaults; timestamps are UTC to match the stub
/// source's offset.
pub fn raw(title: &str, link: &str, published: &str) -> RawEntry {
    RawEntry {
        title: title.to_string(),
        link: link.to_string(),
        size: "1.2 GB".to_string(),
        quality: "1080p".to_string(),
        published: published.to_string(),
    }
}

/// Aggregator over stub sources with tight test timeouts and the `a > b`
/// source priority.
pub fn aggregator(sources: Vec<Arc<dyn ReleaseSource>>) -> FeedAggregator {
    let fetch = FetchConfig {
        per_source_timeout: Duration::from_millis(200),
        overall_timeout: Duration::from_millis(500),
        ..FetchConfig::default()
    };
    let priority = SourcePriority::new(vec!["a".to_string(), "b".to_string()]);
    FeedAggregator::with_sources(sources, fetch, priority)
}
