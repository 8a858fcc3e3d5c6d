//! Scripted source for testing.

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use super::{FetchOutcome, ReleaseSource};
#[cfg(test)]
use crate::errors::FetchError;
#[cfg(test)]
use crate::types::RawEntry;

/// Scripted source returning a fixed outcome, optionally after a delay.
#[cfg(test)]
#[derive(Debug)]
pub struct MockSource {
    label: &'static str,
    delay: Duration,
    outcome: Result<Vec<RawEntry>, FetchError>,
}

#[cfg(test)]
impl MockSource {
    /// Source that yields the given raw entries.
    pub fn ok(label: &'static str, entries: Vec<RawEntry>) -> Self {
        Self {
            label,
            delay: Duration::ZERO,
            outcome: Ok(entries),
        }
    }

    /// Source that fails with the given error.
    pub fn failing(label: &'static str, error: FetchError) -> Self {
        Self {
            label,
            delay: Duration::ZERO,
            outcome: Err(error),
        }
    }

    /// Delays the outcome, for timeout tests.
    pub fn slow(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

#[cfg(test)]
#[async_trait]
impl ReleaseSource for MockSource {
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
