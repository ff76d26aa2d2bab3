//! Markdown rendering of the feed listing.
//!
//! Records are listed newest first. Each one renders as a linked heading,
//! an optional metadata line built only from the fields that are present,
//! a summary snippet capped at [`SUMMARY_LIMIT`] characters and a rule:
//!
//! ```text
//! ## [Title](https://www.neosherlock.com/archives/123)
//!
//! **Author**: 김기자 · **Published**: 2024-03-15 09:30 KST
//!
//! First 300 characters of the summary...
//!
//! ---
//! ```

use crate::models::{ArticleRecord, KST};
use crate::pipeline::DisplayState;
use crate::utils::truncate_chars;
use chrono::{DateTime, FixedOffset, Utc};
use std::cmp::Reverse;
use std::fmt::Write;

/// Maximum summary length shown per article, in characters.
pub const SUMMARY_LIMIT: usize = 300;

pub const ELLIPSIS: &str = "...";

/// Joins the author and date on the metadata line.
pub const META_SEPARATOR: &str = " · ";

/// Sort key: the publish instant, or [`DateTime::<Utc>::MIN_UTC`] when absent.
pub fn sort_key(record: &ArticleRecord) -> DateTime<Utc> {
    record
        .published_at()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Newest first; undated records sink to the end in their original order.
pub fn sort_newest_first(records: &mut [ArticleRecord]) {
    records.sort_by_key(|record| Reverse(sort_key(record)));
}

/// Format a timestamp in UTC+9, whatever offset it was stored with.
pub fn display_date(dt: DateTime<FixedOffset>) -> String {
    dt.with_timezone(&KST).format("%Y-%m-%d %H:%M KST").to_string()
}

/// Author and date joined by [`META_SEPARATOR`], or `None` when neither is present.
pub fn meta_line(record: &ArticleRecord) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(author) = record.author().name() {
        parts.push(format!("**Author**: {author}"));
    }
    if let Some(published) = record.published_at() {
        parts.push(format!("**Published**: {}", display_date(published)));
    }
    (!parts.is_empty()).then(|| parts.join(META_SEPARATOR))
}

/// Trimmed summary, cut to [`SUMMARY_LIMIT`] characters plus an ellipsis when longer.
pub fn snippet(summary: &str) -> String {
    truncate_chars(summary.trim(), SUMMARY_LIMIT, ELLIPSIS)
}

pub fn record_to_markdown(record: &ArticleRecord) -> String {
    let mut md = String::new();
    let title = escape_link_text(record.title());
    if record.link().is_empty() {
        writeln!(md, "## {title}\n").unwrap();
    } else {
        writeln!(md, "## [{title}]({})\n", link_destination(record.link())).unwrap();
    }
    if let Some(meta) = meta_line(record) {
        writeln!(md, "{meta}\n").unwrap();
    }
    let snippet = snippet(record.summary());
    if !snippet.is_empty() {
        writeln!(md, "{snippet}\n").unwrap();
    }
    writeln!(md, "---\n").unwrap();
    md
}

/// Render a full page for `state`.
///
/// The heading is the feed's own channel title when it has one, otherwise
/// `default_title`.
pub fn render_page(default_title: &str, state: DisplayState) -> String {
    let mut md = String::new();
    let title = match &state {
        DisplayState::Listing {
            channel_title: Some(title),
            ..
        }
        | DisplayState::Empty {
            channel_title: Some(title),
            ..
        } => title.as_str(),
        _ => default_title,
    };
    writeln!(md, "# {title}\n").unwrap();

    match state {
        DisplayState::Listing {
            mut records,
            notices,
            ..
        } => {
            write_notices(&mut md, &notices);
            sort_newest_first(&mut records);
            for record in &records {
                md.push_str(&record_to_markdown(record));
            }
        }
        DisplayState::Empty { notices, .. } => {
            write_notices(&mut md, &notices);
            writeln!(md, "_No articles in the feed yet._").unwrap();
        }
        DisplayState::Failed { message } => {
            writeln!(md, "**Error**: {message}").unwrap();
        }
    }
    md
}

fn write_notices(md: &mut String, notices: &[String]) {
    for notice in notices {
        writeln!(md, "> ⚠️ {notice}\n").unwrap();
    }
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Wrap a link in `<...>` when it holds characters that end a bare destination.
fn link_destination(link: &str) -> String {
    if link.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", link.replace('<', "\\<").replace('>', "\\>"))
    } else {
        link.to_string()
    }
}
