//! Shinbun core - release feed aggregation
//!
//! Fetches new-release listings from multiple anime sources in parallel,
//! normalizes them into one canonical entry shape, deduplicates releases
//! reported by more than one source, and encodes the resulting snapshot
//! for the dashboard's wire contract.

pub mod aggregate;
pub mod config;
pub mod dedupe;
pub mod errors;
pub mod normalize;
pub mod response;
pub mod sources;
pub mod tracing_setup;
pub mod types;

// Re-export main types
pub use aggregate::{AggregateResult, FeedAggregator};
pub use config::ShinbunConfig;
pub use dedupe::SourcePriority;
pub use errors::{FetchError, RejectReason};
pub use response::{NO_RELEASES_MESSAGE, WireResponse, encode};
pub use sources::{FetchOutcome, ReleaseSource};
pub use types::{RawEntry, ReleaseEntry};
