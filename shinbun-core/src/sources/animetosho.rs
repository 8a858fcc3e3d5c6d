//! AnimeTosho feed adapter.
//!
//! The site exposes its latest releases as a JSON feed with epoch
//! timestamps and byte-exact sizes, so this adapter does typed
//! deserialization instead of scraping.

use async_trait::async_trait;
use serde::Deserialize;

use super::{FetchOutcome, ReleaseSource, guess_quality};
use crate::config::SourcesConfig;
use crate::errors::FetchError;
use crate::types::RawEntry;

const LABEL: &str = "animetosho.org";

/// Adapter for the AnimeTosho JSON feed.
#[derive(Debug)]
pub struct AnimeToshoSource {
    client: reqwest::Client,
    feed_url: String,
}

/// One release in the site's JSON feed.
#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    link: String,
    timestamp: i64,
    total_size: Option<u64>,
    magnet_uri: Option<String>,
}

impl AnimeToshoSource {
    /// Creates the adapter against the configured feed endpoint.
    pub fn new(client: reqwest::Client, config: &SourcesConfig) -> Self {
        Self::with_feed_url(client, config.animetosho_feed_url.clone())
    }

    /// Creates the adapter against an explicit feed endpoint, for tests.
    pub fn with_feed_url(client: reqwest::Client, feed_url: String) -> Self {
        Self { client, feed_url }
    }
}

#[async_trait]
impl ReleaseSource for AnimeToshoSource {
    fn label(&self) -> &str {
        LABEL
    }

    async fn fetch_releases(&self) -> FetchOutcome {
        let response = self.client.get(&self.feed_url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Blocked {
                reason: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network {
                reason: format!("HTTP {status}"),
            });
        }

        let items: Vec<FeedItem> =
            response.json().await.map_err(|err| FetchError::Parse {
                reason: format!("feed decode failed: {err}"),
            })?;

        Ok(items.into_iter().map(to_raw_entry).collect())
    }
}

/// Maps one feed item onto the raw record shape the normalizer expects.
fn to_raw_entry(item: FeedItem) -> RawEntry {
    let link = item.magnet_uri.unwrap_or(item.link);
    let size = item.total_size.map(format_bytes).unwrap_or_default();

    RawEntry {
        quality: guess_quality(&item.title),
        title: item.title,
        link,
        size,
        published: item.timestamp.to_string(),
    }
}

/// Renders a byte-exact size the way human listings print them.
fn format_bytes(bytes: u64) -> String {
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    const KB: f64 = 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{:.0} KB", bytes / KB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"[
        {
            "id": 700001,
            "title": "[SubsPlease] Shuumatsu Touring - 04 (1080p)",
            "link": "https://animetosho.org/view/subsplease-shuumatsu-touring-04.700001",
            "timestamp": 1761472800,
            "total_size": 859638988,
            "magnet_uri": "magnet:?xt=urn:btih:5e198eb8db4c&tr=http%3A%2F%2Fexample"
        },
        {
            "id": 700002,
            "title": "[Erai-raws] Kamen Rider Zeztz - 08",
            "link": "https://animetosho.org/view/erai-raws-kamen-rider-zeztz-08.700002",
            "timestamp": 1761435180,
            "total_size": null,
            "magnet_uri": null
        }
    ]"#;

    #[test]
    fn feed_items_decode_and_map_to_raw_entries() {
        let items: Vec<FeedItem> = serde_json::from_str(FEED).unwrap();
        let entries: Vec<RawEntry> = items.into_iter().map(to_raw_entry).collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].link,
            "magnet:?xt=urn:btih:5e198eb8db4c&tr=http%3A%2F%2Fexample"
        );
        assert_eq!(entries[0].size, "819.8 MB");
        assert_eq!(entries[0].published, "1761472800");
        assert_eq!(entries[0].quality, "1080p");
    }

    #[test]
    fn missing_magnet_and_size_fall_back_gracefully() {
        let items: Vec<FeedItem> = serde_json::from_str(FEED).unwrap();
        let entries: Vec<RawEntry> = items.into_iter().map(to_raw_entry).collect();

        assert_eq!(
            entries[1].link,
            "https://animetosho.org/view/erai-raws-kamen-rider-zeztz-08.700002"
        );
        assert_eq!(entries[1].size, "");
    }

    #[test]
    fn byte_sizes_render_in_human_units() {
        assert_eq!(format_bytes(1_610_612_736), "1.50 GB");
        assert_eq!(format_bytes(650_117_120), "620.0 MB");
        assert_eq!(format_bytes(512_000), "500 KB");
    }
}
