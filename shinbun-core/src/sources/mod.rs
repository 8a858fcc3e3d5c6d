//! Source adapters for the sites the feed aggregates.
//!
//! Each adapter knows one site: how to fetch its new-release listing and
//! how to parse that site's markup or JSON into raw records. New sites are
//! added by implementing [`ReleaseSource`], never by touching the
//! aggregator.

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use regex::Regex;
use url::Url;

use crate::errors::FetchError;
use crate::types::RawEntry;

pub mod animetosho;
pub mod comicat;
pub mod dmhy;
pub mod mock;

pub use animetosho::AnimeToshoSource;
pub use comicat::ComicatSource;
pub use dmhy::DmhySource;
#[cfg(test)]
pub use mock::MockSource;

/// Per-fetch result of one source: its raw entries, or a typed failure.
pub type FetchOutcome = Result<Vec<RawEntry>, FetchError>;

/// Trait for release listing sources.
///
/// Implementations fetch one site's listing and parse it with
/// site-specific rules. A listing that is currently empty is a valid
/// `Ok` outcome, not a failure.
#[async_trait]
pub trait ReleaseSource: Send + Sync + std::fmt::Debug {
    /// Site/subtitle-group label stamped on entries from this source.
    fn label(&self) -> &str;

    /// UTC offset the site renders its local timestamps in.
    fn utc_offset(&self) -> FixedOffset {
        Utc.fix()
    }

    /// Fetches and parses the site's current listing.
    ///
    /// # Errors
    /// - `FetchError::Network` - connection, DNS, or transport failure
    /// - `FetchError::Timeout` - the site was too slow to answer
    /// - `FetchError::Blocked` - captcha, rate limit, or block page
    /// - `FetchError::Parse` - the page no longer has the expected shape
    async fn fetch_releases(&self) -> FetchOutcome;
}

/// Collapses whitespace runs the way browsers render them.
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins a possibly-relative href against the site base. Absolute hrefs
/// (including magnet URIs) pass through untouched.
pub(crate) fn absolutize(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|parsed| parsed.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Guesses a quality descriptor from title text, highest tier first.
/// Unknown stays empty; quality is display-only.
pub(crate) fn guess_quality(title: &str) -> String {
    let tiers = [
        r"(?i)2160p|4K|UHD",
        r"(?i)1080p|BDRip|BluRay|WEB[- ]?DL|WEB[- ]?Rip|HEVC|x265|x264",
        r"(?i)720p",
    ];
    for tier in tiers {
        let Ok(re) = Regex::new(tier) else { continue };
        if let Some(found) = re.find(title) {
            return found.as_str().to_string();
        }
    }
    String::new()
}
