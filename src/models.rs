//! Data models for scraped articles and the feed they are published in.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: One article's metadata, as extracted or as read back from a feed
//! - [`Author`]: Explicit byline model with an `Unknown` sentinel
//! - [`FeedMeta`]: Channel-level title, link and description
//!
//! Records are immutable once built. The extractor and the feed reader both
//! construct fresh records through [`ArticleRecord::new`], which enforces the
//! title and link invariants.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Placeholder title for entries whose heading cannot be extracted.
pub const NO_TITLE: &str = "No Title";

/// Display form of [`Author::Unknown`].
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Fixed UTC+9 offset used by the source site and for display.
pub const KST: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC+9 is a valid offset"),
};

/// The byline of an article.
///
/// `Unknown` is the sentinel for "no author could be extracted". It is a
/// valid state, not an error, and it is what an `<item>` without an
/// `<author>` element reads back as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Author {
    Known(String),
    #[default]
    Unknown,
}

impl Author {
    /// Build an author from raw text; blank text yields [`Author::Unknown`].
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Author::Unknown
        } else {
            Author::Known(trimmed.to_string())
        }
    }

    /// The author's name, or `None` for the sentinel.
    pub fn name(&self) -> Option<&str> {
        match self {
            Author::Known(name) => Some(name.as_str()),
            Author::Unknown => None,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or(UNKNOWN_AUTHOR))
    }
}

/// One article's metadata.
///
/// # Invariants
///
/// * `title` is never empty (falls back to [`NO_TITLE`])
/// * `link` is an absolute `http`/`https` URL
///
/// Fields are private so a record cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    title: String,
    author: Author,
    published_at: Option<DateTime<FixedOffset>>,
    summary: String,
    link: String,
}

impl ArticleRecord {
    /// Build a record, returning `None` when `link` is not an absolute web URL.
    ///
    /// The title is trimmed; a blank title is replaced by [`NO_TITLE`].
    /// The summary is stored verbatim apart from trimming; truncation only
    /// happens at render time.
    pub fn new(
        title: &str,
        author: Author,
        published_at: Option<DateTime<FixedOffset>>,
        summary: &str,
        link: &str,
    ) -> Option<Self> {
        let link = link.trim();
        let parsed = Url::parse(link).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return None;
        }

        let title = title.trim();
        let title = if title.is_empty() { NO_TITLE } else { title };

        Some(Self {
            title: title.to_string(),
            author,
            published_at,
            summary: summary.trim().to_string(),
            link: link.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn link(&self) -> &str {
        &self.link
    }
}

/// Channel-level metadata written into the feed document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedMeta {
    /// Channel title, e.g. "셜록 Archives".
    pub title: String,
    /// Channel link, normally the archive URL.
    pub link: String,
    /// Human-readable channel description.
    pub description: String,
}
