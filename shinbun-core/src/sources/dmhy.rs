//! Dmhy listing adapter.
//!
//! Scrapes the front-page topic table. Unlike Comicat, magnet links are
//! present directly in the listing row; the detail page is only used as a
//! fallback link when the magnet anchor is missing.

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use scraper::{Html, Selector};

use super::{FetchOutcome, ReleaseSource, absolutize, clean_text, guess_quality};
use crate::config::SourcesConfig;
use crate::errors::FetchError;
use crate::types::RawEntry;

const LABEL: &str = "share.dmhy.org";

/// Adapter for the Dmhy topic listing.
#[derive(Debug)]
pub struct DmhySource {
    client: reqwest::Client,
    base_url: String,
    utc_offset: FixedOffset,
}

impl DmhySource {
    /// Creates the adapter against the configured site root.
    pub fn new(client: reqwest::Client, config: &SourcesConfig) -> Self {
        Self::with_base_url(client, config.dmhy_base_url.clone())
    }

    /// Creates the adapter against an explicit site root, for tests.
    pub fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            // Timestamps are rendered in UTC+8
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }

    fn parse_listing(&self, html: &str) -> FetchOutcome {
        let document = Html::parse_document(html);
        let table = selector("table#topic_list tbody")?;
        let rows = selector("tr")?;
        let cells = selector("td")?;
        let title_anchors = selector(r#"a[href^="/topics/view/"]"#)?;
        let magnet_anchors = selector(r#"a[href^="magnet:"]"#)?;

        let Some(listing) = document.select(&table).next() else {
            return Err(FetchError::Parse {
                reason: "topic table not found".to_string(),
            });
        };

        let mut entries = Vec::new();
        for row in listing.select(&rows) {
            let columns: Vec<_> = row.select(&cells).collect();
            // time, category, title, download, size at minimum
            if columns.len() < 5 {
                continue;
            }

            let published = clean_text(&columns[0].text().collect::<String>());
            let Some(anchor) = columns[2].select(&title_anchors).next() else {
                continue;
            };
            let title = clean_text(&anchor.text().collect::<String>());

            // Magnet straight from the row when the site provides one
            let link = match row.select(&magnet_anchors).next() {
                Some(magnet) => magnet.value().attr("href").unwrap_or_default().to_string(),
                None => {
                    let href = anchor.value().attr("href").unwrap_or_default().trim();
                    absolutize(&self.base_url, href)
                }
            };

            let size = clean_text(&columns[4].text().collect::<String>());

            entries.push(RawEntry {
                quality: guess_quality(&title),
                title,
                link,
                size,
                published,
            });
        }

        Ok(entries)
    }
}

#[async_trait]
impl ReleaseSource for DmhySource {
    fn label(&self) -> &str {
        LABEL
    }

    fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    async fn fetch_releases(&self) -> FetchOutcome {
        let url = format!("{}/topics/list", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FetchError::Blocked {
                reason: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network {
                reason: format!("HTTP {status}"),
            });
        }

        let html = response.text().await?;
        self.parse_listing(&html)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|err| FetchError::Parse {
        reason: err.to_string(),
    })
}
