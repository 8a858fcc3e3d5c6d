//! Error types for the release feed pipeline.

use thiserror::Error;

/// Failure modes a source adapter can report for one fetch attempt.
///
/// A listing with zero new items is not a failure; adapters return an
/// empty batch for that.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection, DNS, or transport failure talking to the site.
    #[error("network error: {reason}")]
    Network {
        /// The reason for the network error
        reason: String,
    },

    /// The fetch exceeded its time budget.
    #[error("fetch timed out")]
    Timeout,

    /// The site answered with a captcha, rate limit, or other block page.
    #[error("blocked by site: {reason}")]
    Blocked {
        /// What the site served instead of the listing
        reason: String,
    },

    /// The response no longer has the expected shape (site layout changed).
    #[error("unexpected response shape: {reason}")]
    Parse {
        /// The reason for the parse error
        reason: String,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network {
                reason: err.to_string(),
            }
        }
    }
}

/// Why the normalizer dropped a single raw record.
///
/// Rejection is silent data loss for that one entry; it never aborts the
/// adapter's batch or the aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    /// Title was empty after trimming.
    #[error("title is empty")]
    EmptyTitle,

    /// Link was neither a magnet URI nor an absolute http(s) URL.
    #[error("not a magnet or absolute http(s) url: {url}")]
    InvalidUrl {
        /// The link text that failed validation
        url: String,
    },

    /// No supported timestamp representation matched.
    #[error("unparseable timestamp: {raw}")]
    UnparseableDate {
        /// The timestamp text as scraped
        raw: String,
    },

    /// Timestamp lies beyond the clock-skew tolerance.
    #[error("timestamp too far in the future: {date}")]
    FutureDate {
        /// The offending instant, rendered RFC 3339
        date: String,
    },
}
