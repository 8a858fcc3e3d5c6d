//! Converts raw source records into canonical release entries.
//!
//! All interpretation of scraped text happens here: URL validation, size
//! unit normalization, and site-local timestamp parsing. A record that
//! cannot be repaired is rejected without affecting the rest of its batch.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use url::Url;

use crate::errors::RejectReason;
use crate::types::{RawEntry, ReleaseEntry};

/// Maximum clock skew tolerated before a timestamp is treated as garbage.
const FUTURE_TOLERANCE_HOURS: i64 = 24;

/// Per-source context the normalizer needs beyond the raw record itself.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Label stamped on every entry from this source
    pub label: String,
    /// UTC offset the site renders its local timestamps in
    pub utc_offset: FixedOffset,
    /// Aggregation instant, anchors relative dates and the skew check
    pub now: DateTime<Utc>,
}

/// Validates and repairs one raw record into a canonical entry.
pub fn normalize_entry(raw: RawEntry, ctx: &SourceContext) -> Result<ReleaseEntry, RejectReason> {
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(RejectReason::EmptyTitle);
    }

    let url = raw.link.trim().to_string();
    if !is_release_url(&url) {
        return Err(RejectReason::InvalidUrl { url });
    }

    let date = parse_site_timestamp(raw.published.trim(), ctx.utc_offset, ctx.now).ok_or_else(
        || RejectReason::UnparseableDate {
            raw: raw.published.clone(),
        },
    )?;
    if date > ctx.now + Duration::hours(FUTURE_TOLERANCE_HOURS) {
        return Err(RejectReason::FutureDate {
            date: date.to_rfc3339(),
        });
    }

    Ok(ReleaseEntry {
        title,
        url,
        size: normalize_size(&raw.size),
        quality: raw.quality.trim().to_string(),
        date,
        source: ctx.label.clone(),
    })
}

/// Accepts magnet URIs and absolute http(s) URLs, nothing else.
fn is_release_url(url: &str) -> bool {
    if url.starts_with("magnet:?xt=urn:btih:") {
        return true;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

/// Re-renders a recognizable size as `"<quantity> <UNIT>"`. Anything else
/// is kept verbatim; size is informational, not structural.
pub fn normalize_size(raw: &str) -> String {
    let raw = raw.trim();
    match parse_size(raw) {
        Some((value, unit)) => format!("{} {}", format_quantity(value), unit),
        None => raw.to_string(),
    }
}

/// Parses a leading quantity plus unit token out of free-form size text.
/// Binary spellings (GiB) fold onto the decimal unit names.
pub(crate) fn parse_size(text: &str) -> Option<(f64, &'static str)> {
    let re = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([KMGT])i?B\b").ok()?;
    let caps = re.captures(text)?;
    let value: f64 = caps[1].parse().ok()?;
    let unit = match caps[2].to_ascii_uppercase().as_str() {
        "K" => "KB",
        "M" => "MB",
        "G" => "GB",
        _ => "TB",
    };
    Some((value, unit))
}

/// At most two decimal places, trailing zeros trimmed.
fn format_quantity(value: f64) -> String {
    let rendered = format!("{value:.2}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Parses the timestamp representations observed across the supported
/// sites: relative CN day words, dashed or slashed local datetimes, unix
/// epoch seconds, and RFC 3339.
fn parse_site_timestamp(
    text: &str,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_relative_day(text, offset, now) {
        return Some(date);
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for format in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return offset
                .from_local_datetime(&naive)
                .single()
                .map(|local| local.with_timezone(&Utc));
        }
    }

    // Unix epoch seconds; the length gate keeps bare "2025" from reading
    // as an instant in 1970.
    if text.len() >= 10 && text.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(secs) = text.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    None
}

/// `今天 21:41` / `昨天 08:12`, relative to the site's local calendar day.
fn parse_relative_day(
    text: &str,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"^(今天|昨天)\s+(\d{1,2}):(\d{2})$").ok()?;
    let caps = re.captures(text)?;

    let local_today = now.with_timezone(&offset).date_naive();
    let day = if &caps[1] == "今天" {
        local_today
    } else {
        local_today.pred_opt()?
    };

    let hour: u32 = caps[2].parse().ok()?;
    let minute: u32 = caps[3].parse().ok()?;
    let naive = day.and_hms_opt(hour, minute, 0)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}
