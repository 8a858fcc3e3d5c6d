//! Comicat listing adapter.
//!
//! Scrapes the site's "today" table. The site sits behind an anti-bot
//! gateway that sometimes swaps the listing for a visitor-check page;
//! that is reported as a blocked fetch so operators can tell it apart
//! from a layout change.

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use scraper::{Html, Selector};

use super::{FetchOutcome, ReleaseSource, absolutize, clean_text, guess_quality};
use crate::config::SourcesConfig;
use crate::errors::FetchError;
use crate::types::RawEntry;

const LABEL: &str = "comicat.org";

/// Markers of the visitor-check interstitial served instead of the listing.
const BLOCK_MARKERS: [&str; 4] = [
    "i'm not a robot",
    "captcha",
    "visitor-test-form",
    "visitor_test",
];

/// Adapter for the Comicat "today" listing.
#[derive(Debug)]
pub struct ComicatSource {
    client: reqwest::Client,
    base_url: String,
    utc_offset: FixedOffset,
}

impl ComicatSource {
    /// Creates the adapter against the configured site root.
    pub fn new(client: reqwest::Client, config: &SourcesConfig) -> Self {
        Self::with_base_url(client, config.comicat_base_url.clone())
    }

    /// Creates the adapter against an explicit site root, for tests.
    pub fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            // Timestamps are rendered in Taipei local time
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }

    /// Parses the listing table into raw records.
    ///
    /// A missing table means the site changed layout; a present table with
    /// no rows is a valid empty listing.
    fn parse_listing(&self, html: &str) -> FetchOutcome {
        let document = Html::parse_document(html);
        let table = selector("table#listTable tbody#data_list")?;
        let rows = selector("tr")?;
        let cells = selector("td")?;
        let anchors = selector("a[href]")?;

        let Some(listing) = document.select(&table).next() else {
            return Err(FetchError::Parse {
                reason: "listing table not found".to_string(),
            });
        };

        let mut entries = Vec::new();
        for row in listing.select(&rows) {
            let columns: Vec<_> = row.select(&cells).collect();
            // time, category, title, size at minimum
            if columns.len() < 4 {
                continue;
            }

            let published = clean_text(&columns[0].text().collect::<String>());
            let Some(anchor) = columns[2].select(&anchors).next() else {
                continue;
            };
            let title = clean_text(&anchor.text().collect::<String>());
            let href = anchor.value().attr("href").unwrap_or_default().trim();
            let size = clean_text(&columns[3].text().collect::<String>());

            entries.push(RawEntry {
                quality: guess_quality(&title),
                link: absolutize(&self.base_url, href),
                title,
                size,
                published,
            });
        }

        Ok(entries)
    }
}

#[async_trait]
impl ReleaseSource for ComicatSource {
    fn label(&self) -> &str {
        LABEL
    }

    fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    async fn fetch_releases(&self) -> FetchOutcome {
        let url = format!("{}/today-1.html", self.base_url.trim_end_matches('/'));
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
        if looks_blocked(&html) {
            return Err(FetchError::Blocked {
                reason: "visitor check page served instead of the listing".to_string(),
            });
        }

        self.parse_listing(&html)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|err| FetchError::Parse {
        reason: err.to_string(),
    })
}

fn looks_blocked(html: &str) -> bool {
    let lowered = html.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <table id="listTable">
          <tbody id="data_list">
            <tr>
              <td>今天 21:41</td>
              <td>动画</td>
              <td><a href="show-ed9716d5.html">[桜都字幕組] 銀八老師 [03][1080p][繁體內嵌]</a></td>
              <td>624MB</td>
            </tr>
            <tr>
              <td>昨天 08:12</td>
              <td>动画</td>
              <td><a href="show-5e198eb8.html">[LoliHouse] 末世二轮之旅 - 04 [WebRip 1080p HEVC-10bit AAC]</a></td>
              <td>819.9MB</td>
            </tr>
            <tr><td>malformed row</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    fn source() -> ComicatSource {
        ComicatSource::with_base_url(reqwest::Client::new(), "https://comicat.org".to_string())
    }

    #[test]
    fn listing_rows_become_raw_entries() {
        let entries = source().parse_listing(LISTING).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].title,
            "[桜都字幕組] 銀八老師 [03][1080p][繁體內嵌]"
        );
        assert_eq!(entries[0].link, "https://comicat.org/show-ed9716d5.html");
        assert_eq!(entries[0].size, "624MB");
        assert_eq!(entries[0].quality, "1080p");
        assert_eq!(entries[0].published, "今天 21:41");
        assert_eq!(entries[1].published, "昨天 08:12");
    }

    #[test]
    fn empty_table_is_a_valid_empty_listing() {
        let html = r#"<table id="listTable"><tbody id="data_list"></tbody></table>"#;
        let entries = source().parse_listing(html).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_table_is_a_parse_failure() {
        let result = source().parse_listing("<html><body><p>redesigned</p></body></html>");
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[test]
    fn visitor_check_markers_are_detected() {
        assert!(looks_blocked(
            "<form id=\"visitor-test-form\">I'm not a robot</form>"
        ));
        assert!(!looks_blocked(LISTING));
    }
}
