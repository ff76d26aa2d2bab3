//! Field extraction from archive entries and article pages.
//!
//! Every function here is a pure transform over a parsed HTML node. A field
//! that cannot be found degrades to its default (sentinel title, unknown
//! author, absent date, empty summary); only a missing article link causes
//! an entry to be discarded.
//!
//! # Date shapes
//!
//! | Layout | Source | Example | Interpretation |
//! |--------|--------|---------|----------------|
//! | Article pages | `meta[property="article:published_time"]` | `2024-03-15T10:20:00+09:00` | ISO-8601, offset kept; naive values read as UTC+9 |
//! | Archive listing | `time`, `.date`, `.entry-date`, `.published` text | `2024.03.15` | midnight UTC+9 |

use crate::config::Layout;
use crate::models::{ArticleRecord, Author, KST};
use crate::utils::collapse_whitespace;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static AUTHOR_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:author"]"#).unwrap());
static PUBLISHED_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static CLASSED: Lazy<Selector> = Lazy::new(|| Selector::parse("[class]").unwrap());
static CLASSED_DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div[class]").unwrap());
static DATE_TEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time, .date, .entry-date, .published").unwrap());
static EXCERPT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".entry-summary, .excerpt, .entry-excerpt, .post-excerpt").unwrap()
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

static RE_BYLINE_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)author|byline").unwrap());
static RE_BODY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)entry-content|post-content").unwrap());
static RE_LISTING_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2})$").unwrap());

/// Offset-less ISO shapes, tried after RFC 3339 fails.
const NAIVE_ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// ISO shapes carrying an offset that RFC 3339 parsing rejects.
const OFFSET_ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Compiled rules for one source site.
#[derive(Debug, Clone)]
pub struct ExtractRules {
    /// Which page shape the archive uses.
    pub layout: Layout,
    /// Absolute article URLs must match this pattern.
    pub link_pattern: Regex,
    /// Selects one entry on the archive page (archive-listing layout).
    pub entry_selector: Selector,
}

/// Heading text for an entry; empty when there is none.
///
/// Article pages take the `h1` headline and only fall back to the first
/// `h2`/`h3` when no `h1` has text. Listing entries take the first of
/// `h1`/`h2`/`h3` in document order.
pub fn extract_title(node: ElementRef<'_>, layout: Layout) -> String {
    match layout {
        Layout::ArticlePages => {
            first_heading(node, &HEADLINE).or_else(|| first_heading(node, &TITLE))
        }
        Layout::ArchiveListing => first_heading(node, &TITLE),
    }
    .unwrap_or_default()
}

/// Author from `article:author` metadata, then from an author/byline-classed element.
pub fn extract_author(node: ElementRef<'_>) -> Author {
    let from_meta = node
        .select(&AUTHOR_META)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());
    if let Some(name) = from_meta {
        return Author::from_text(name);
    }

    node.select(&CLASSED)
        .filter(|el| el.value().classes().any(|class| RE_BYLINE_CLASS.is_match(class)))
        .map(element_text)
        .find(|text| !text.is_empty())
        .map(|text| Author::from_text(&text))
        .unwrap_or_default()
}

/// Publish timestamp in the shape the layout uses; `None` when absent or unparseable.
pub fn extract_published(node: ElementRef<'_>, layout: Layout) -> Option<DateTime<FixedOffset>> {
    match layout {
        Layout::ArticlePages => node
            .select(&PUBLISHED_META)
            .filter_map(|meta| meta.value().attr("content"))
            .find(|content| !content.trim().is_empty())
            .and_then(parse_iso_timestamp),
        Layout::ArchiveListing => node
            .select(&DATE_TEXT)
            .map(element_text)
            .find_map(|text| parse_listing_date(&text)),
    }
}

/// Parse an ISO-8601 timestamp; values without an offset are read as UTC+9.
pub fn parse_iso_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Some(dt) = OFFSET_ISO_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    if let Some(naive) = NAIVE_ISO_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return KST.from_local_datetime(&naive).single();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| KST.from_local_datetime(&naive).single())
}

/// Parse an archive-listing date such as `2024.03.15` as midnight UTC+9.
pub fn parse_listing_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let caps = RE_LISTING_DATE.captures(raw.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    KST.from_local_datetime(&midnight).single()
}

/// Summary text for an entry.
///
/// Article pages prefer the `entry-content`/`post-content` body with its
/// paragraph breaks; listings prefer the excerpt with whitespace collapsed.
/// Either way the fallback is every nonempty `<p>` joined by newlines.
pub fn extract_summary(node: ElementRef<'_>, layout: Layout) -> String {
    let preferred = match layout {
        Layout::ArticlePages => node
            .select(&CLASSED_DIV)
            .find(|el| el.value().classes().any(|class| RE_BODY_CLASS.is_match(class)))
            .map(body_text),
        Layout::ArchiveListing => node.select(&EXCERPT).next().map(element_text),
    };

    match preferred {
        Some(text) if !text.is_empty() => text,
        _ => node
            .select(&PARAGRAPH)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .join("\n"),
    }
}

/// First link under `node` that resolves to an article URL.
pub fn extract_article_link(node: ElementRef<'_>, base: &Url, pattern: &Regex) -> Option<String> {
    node.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(String::from)
        .find(|url| pattern.is_match(url))
}

/// Every distinct article link on an archive page, in order of first appearance.
pub fn archive_links(document: &Html, base: &Url, pattern: &Regex) -> Vec<String> {
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(String::from)
        .filter(|url| pattern.is_match(url))
        .unique()
        .collect()
}

/// Build a record from a fully fetched article page.
pub fn extract_article_page(document: &Html, url: &str) -> Option<ArticleRecord> {
    let root = document.root_element();
    let record = ArticleRecord::new(
        &extract_title(root, Layout::ArticlePages),
        extract_author(root),
        extract_published(root, Layout::ArticlePages),
        &extract_summary(root, Layout::ArticlePages),
        url,
    );
    if record.is_none() {
        debug!(%url, "Article page URL is not an absolute link; discarded");
    }
    record
}

/// Build a record from one archive-listing entry; `None` when it has no article link.
pub fn extract_listing_entry(
    node: ElementRef<'_>,
    base: &Url,
    rules: &ExtractRules,
) -> Option<ArticleRecord> {
    let link = extract_article_link(node, base, &rules.link_pattern)?;
    ArticleRecord::new(
        &extract_title(node, Layout::ArchiveListing),
        extract_author(node),
        extract_published(node, Layout::ArchiveListing),
        &extract_summary(node, Layout::ArchiveListing),
        &link,
    )
}

/// Extract every entry of an archive-listing page, skipping entries without a link.
pub fn extract_listing(document: &Html, base: &Url, rules: &ExtractRules) -> Vec<ArticleRecord> {
    document
        .select(&rules.entry_selector)
        .enumerate()
        .filter_map(|(index, entry)| {
            let record = extract_listing_entry(entry, base, rules);
            if record.is_none() {
                debug!(index, "Listing entry has no article link; discarded");
            }
            record
        })
        .collect()
}

fn first_heading(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn body_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .join("\n")
}
