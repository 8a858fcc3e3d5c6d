//! Cross-source deduplication of normalized entries.
//!
//! Sources routinely report the same release with different casing,
//! spacing, or episode-number formatting. Grouping happens under a derived
//! key; exactly one representative survives per group, the rest are
//! dropped without merging their fields.

use std::collections::HashMap;

use regex::Regex;

use crate::normalize::parse_size;
use crate::types::ReleaseEntry;

/// Derived identity under which the same release is recognized across
/// sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derives the key from an entry's title.
    pub fn for_entry(entry: &ReleaseEntry) -> Self {
        Self::from_title(&entry.title)
    }

    /// Lowercases, drops punctuation and spacing, and canonicalizes the
    /// episode number so `Ep 01`, `[1]` and `第1集` agree.
    pub fn from_title(title: &str) -> Self {
        let lowered = title.to_lowercase();
        let (body, episode) = split_episode(&lowered);
        let mut key: String = body.chars().filter(|c| c.is_alphanumeric()).collect();
        if let Some(number) = episode {
            key.push('#');
            key.push_str(&number.to_string());
        }
        DedupKey(key)
    }
}

/// Pulls the first recognizable episode marker out of a lowercased title,
/// returning the remaining text and the episode number.
fn split_episode(title: &str) -> (String, Option<u32>) {
    let patterns = [
        r"第\s*0*(\d{1,4})\s*[集话話]",
        r"\be(?:p(?:isode)?)?\s*\.?\s*0*(\d{1,3})\b",
        r"\[0*(\d{1,3})\]",
        r"-\s*0*(\d{1,3})\b",
    ];
    for pattern in patterns {
        let Ok(re) = Regex::new(pattern) else { continue };
        let Some(caps) = re.captures(title) else {
            continue;
        };
        if let (Some(whole), Ok(number)) = (caps.get(0), caps[1].parse::<u32>()) {
            let mut body = String::with_capacity(title.len());
            body.push_str(&title[..whole.start()]);
            body.push_str(&title[whole.end()..]);
            return (body, Some(number));
        }
    }
    (title.to_string(), None)
}

/// Source-priority order used to break ties between duplicates.
#[derive(Debug, Clone, Default)]
pub struct SourcePriority {
    order: Vec<String>,
}

impl SourcePriority {
    /// Builds the priority from a label list, most trusted first.
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }

    /// Rank of a source label; unconfigured sources sort last.
    pub fn rank(&self, source: &str) -> usize {
        self.order
            .iter()
            .position(|label| label == source)
            .unwrap_or(self.order.len())
    }
}

/// Collapses entries describing the same release down to one survivor per
/// group. Output order is deterministic but not yet final; the aggregator
/// applies the feed ordering.
pub fn dedupe(entries: Vec<ReleaseEntry>, priority: &SourcePriority) -> Vec<ReleaseEntry> {
    // Pooled input arrives in source-completion order; fix the order first
    // so grouping decisions cannot depend on which fetch finished when.
    let mut entries = entries;
    entries.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.url.cmp(&b.url))
            .then_with(|| a.date.cmp(&b.date))
    });

    let mut survivors: HashMap<DedupKey, ReleaseEntry> = HashMap::new();
    // Secondary identity: the same URL is the same release even when the
    // display titles disagree.
    let mut url_keys: HashMap<String, DedupKey> = HashMap::new();

    for entry in entries {
        let key = url_keys
            .get(&entry.url)
            .cloned()
            .unwrap_or_else(|| DedupKey::for_entry(&entry));
        if !entry.url.is_empty() {
            url_keys.entry(entry.url.clone()).or_insert_with(|| key.clone());
        }

        match survivors.remove(&key) {
            Some(incumbent) => {
                survivors.insert(key, pick_survivor(incumbent, entry, priority));
            }
            None => {
                survivors.insert(key, entry);
            }
        }
    }

    let mut kept: Vec<ReleaseEntry> = survivors.into_values().collect();
    kept.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.url.cmp(&b.url))
    });
    kept
}

/// Keeps the better of two duplicates: parseable size first, then source
/// priority, then the more recent date, then the incumbent.
fn pick_survivor(
    incumbent: ReleaseEntry,
    challenger: ReleaseEntry,
    priority: &SourcePriority,
) -> ReleaseEntry {
    let incumbent_sized = parse_size(&incumbent.size).is_some();
    let challenger_sized = parse_size(&challenger.size).is_some();
    if incumbent_sized != challenger_sized {
        return if incumbent_sized { incumbent } else { challenger };
    }

    let incumbent_rank = priority.rank(&incumbent.source);
    let challenger_rank = priority.rank(&challenger.source);
    if incumbent_rank != challenger_rank {
        return if incumbent_rank < challenger_rank {
            incumbent
        } else {
            challenger
        };
    }

    if challenger.date > incumbent.date {
        challenger
    } else {
        incumbent
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Timelike, Utc};
    use proptest::prelude::*;

    use super::*;

    fn entry(title: &str, url: &str, size: &str, source: &str, hour: u32) -> ReleaseEntry {
        ReleaseEntry {
            title: title.to_string(),
            url: url.to_string(),
            size: size.to_string(),
            quality: "1080p".to_string(),
            date: Utc.with_ymd_and_hms(2025, 10, 26, hour, 0, 0).unwrap(),
            source: source.to_string(),
        }
    }

    fn priority() -> SourcePriority {
        SourcePriority::new(vec![
            "comicat.org".to_string(),
            "share.dmhy.org".to_string(),
        ])
    }

    #[test]
    fn case_and_spacing_variants_share_a_key() {
        assert_eq!(
            DedupKey::from_title("Show X - Ep 1"),
            DedupKey::from_title("show   x - ep 1")
        );
    }

    #[test]
    fn episode_number_formats_agree() {
        let reference = DedupKey::from_title("Show X Ep 1");
        assert_eq!(DedupKey::from_title("Show X [01]"), reference);
        assert_eq!(DedupKey::from_title("Show X - 1"), reference);
        assert_eq!(DedupKey::from_title("Show X E01"), reference);
    }

    #[test]
    fn cn_episode_marker_is_recognized() {
        assert_eq!(
            DedupKey::from_title("葬送的芙莉莲 第07集"),
            DedupKey::from_title("葬送的芙莉莲 [7]")
        );
    }

    #[test]
    fn different_episodes_stay_distinct() {
        assert_ne!(
            DedupKey::from_title("Show X - Ep 1"),
            DedupKey::from_title("Show X - Ep 2")
        );
    }

    #[test]
    fn higher_priority_source_wins_the_group() {
        let kept = dedupe(
            vec![
                entry("show x - ep 1", "https://b/1", "1 GB", "share.dmhy.org", 9),
                entry("Show X - Ep 1", "https://a/1", "1 GB", "comicat.org", 10),
            ],
            &priority(),
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "comicat.org");
    }

    #[test]
    fn parseable_size_beats_priority() {
        let kept = dedupe(
            vec![
                entry("Show X - Ep 1", "https://a/1", "未知大小", "comicat.org", 10),
                entry("show x - ep 1", "https://b/1", "1.2 GB", "share.dmhy.org", 9),
            ],
            &priority(),
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "share.dmhy.org");
    }

    #[test]
    fn most_recent_date_breaks_remaining_ties() {
        let kept = dedupe(
            vec![
                entry("Show X - Ep 1", "https://a/1", "1 GB", "comicat.org", 9),
                entry("show x - ep 1", "https://a/2", "1 GB", "comicat.org", 11),
            ],
            &priority(),
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date.hour(), 11);
    }

    #[test]
    fn identical_urls_merge_even_when_titles_differ() {
        let kept = dedupe(
            vec![
                entry("Fan title", "https://a/1", "1 GB", "comicat.org", 10),
                entry("Completely other name", "https://a/1", "1 GB", "share.dmhy.org", 9),
            ],
            &priority(),
        );

        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn unrelated_entries_all_survive() {
        let kept = dedupe(
            vec![
                entry("Show X - Ep 1", "https://a/1", "1 GB", "comicat.org", 10),
                entry("Show Y - Ep 1", "https://a/2", "1 GB", "comicat.org", 10),
                entry("Show X - Ep 2", "https://a/3", "1 GB", "comicat.org", 10),
            ],
            &priority(),
        );

        assert_eq!(kept.len(), 3);
    }

    fn arb_entry() -> impl Strategy<Value = ReleaseEntry> {
        let titles = prop_oneof![
            Just("Show X - Ep 1"),
            Just("show x ep 01"),
            Just("Show Y [02]"),
            Just("葬送的芙莉莲 第07集"),
        ];
        let urls = prop_oneof![
            Just("magnet:?xt=urn:btih:aaa"),
            Just("https://a/1"),
            Just("https://b/2"),
        ];
        let sizes = prop_oneof![Just("1.23 GB"), Just("未知大小")];
        let sources = prop_oneof![
            Just("comicat.org"),
            Just("share.dmhy.org"),
            Just("animetosho.org"),
        ];

        (titles, urls, sizes, sources, 0u32..48).prop_map(|(title, url, size, source, hours)| {
            ReleaseEntry {
                title: title.to_string(),
                url: url.to_string(),
                size: size.to_string(),
                quality: String::new(),
                date: DateTime::from_timestamp(1_761_400_000 + i64::from(hours) * 3600, 0)
                    .unwrap(),
                source: source.to_string(),
            }
        })
    }

    proptest! {
        #[test]
        fn dedupe_is_idempotent(entries in proptest::collection::vec(arb_entry(), 0..24)) {
            let priority = priority();
            let once = dedupe(entries, &priority);
            let twice = dedupe(once.clone(), &priority);
            prop_assert_eq!(once, twice);
        }
    }
}
