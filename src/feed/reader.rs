//! Loading a persisted RSS document back into records.
//!
//! Parsing is best-effort. Every `<item>` that is closed before the first
//! XML error (or before a truncated end of file) is kept, and the problem is
//! reported as a warning next to the recovered records. Only when nothing
//! can be recovered from a damaged document does reading fail.

use crate::error::FeedReadError;
use crate::models::{ArticleRecord, Author};
use crate::utils::truncate_for_log;
use chrono::DateTime;
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Records recovered from a feed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLoad {
    /// `<channel><title>`, when the document has a nonempty one.
    pub channel_title: Option<String>,
    pub records: Vec<ArticleRecord>,
    /// Set when the document was damaged but some items were recovered.
    pub warning: Option<String>,
}

/// Result of parsing a document in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub channel_title: Option<String>,
    pub records: Vec<ArticleRecord>,
    /// Description of the first structural problem, if any.
    pub problem: Option<String>,
}

/// Read and parse the feed at `path`.
///
/// # Errors
///
/// * [`FeedReadError::NotFound`] when the file does not exist
/// * [`FeedReadError::Unreadable`] for any other I/O failure
/// * [`FeedReadError::Malformed`] when the document is damaged and no item survives
#[instrument(level = "info", fields(path = %path.display()))]
pub async fn read_feed(path: &Path) -> Result<FeedLoad, FeedReadError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FeedReadError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(FeedReadError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let parsed = parse_feed(&bytes);
    debug!(channel = ?parsed.channel_title, bytes = bytes.len(), "Parsed feed document");
    let channel_title = parsed.channel_title.filter(|title| !title.is_empty());
    match parsed.problem {
        Some(reason) if parsed.records.is_empty() => {
            warn!(
                %reason,
                head = %truncate_for_log(&String::from_utf8_lossy(&bytes), 120),
                "Feed is malformed; nothing recovered"
            );
            Err(FeedReadError::Malformed {
                path: path.to_path_buf(),
                reason,
            })
        }
        Some(reason) => {
            warn!(recovered = parsed.records.len(), %reason, "Feed is damaged; using recovered items");
            Ok(FeedLoad {
                channel_title,
                records: parsed.records,
                warning: Some(reason),
            })
        }
        None => {
            info!(count = parsed.records.len(), "Loaded feed");
            Ok(FeedLoad {
                channel_title,
                records: parsed.records,
                warning: None,
            })
        }
    }
}

/// Fields of the `<item>` currently being read.
#[derive(Debug, Default)]
struct ItemDraft {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    author: Option<String>,
    pub_date: Option<String>,
}

impl ItemDraft {
    fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "title" => &mut self.title,
            "link" => &mut self.link,
            "description" => &mut self.description,
            "author" => &mut self.author,
            "pubDate" => &mut self.pub_date,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_record(self) -> Option<ArticleRecord> {
        let link = self.link.filter(|link| !link.trim().is_empty())?;
        let published_at = self.pub_date.as_deref().and_then(|raw| {
            let raw = raw.trim();
            DateTime::parse_from_rfc2822(raw)
                .or_else(|_| DateTime::parse_from_rfc3339(raw))
                .ok()
        });
        ArticleRecord::new(
            self.title.as_deref().unwrap_or_default(),
            self.author.as_deref().map(Author::from_text).unwrap_or_default(),
            published_at,
            self.description.as_deref().unwrap_or_default(),
            &link,
        )
    }
}

/// Parse an RSS document from bytes, recovering what it can.
pub fn parse_feed(bytes: &[u8]) -> ParsedFeed {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&text);

    let mut stack: Vec<String> = Vec::new();
    // depth of the open <item>, if any
    let mut item_depth: Option<usize> = None;
    let mut draft = ItemDraft::default();
    // (element name, depth) of the direct child of <item> or <channel> being read
    let mut field: Option<(String, usize)> = None;
    let mut buf = String::new();

    let mut channel_title = None;
    let mut records = Vec::new();
    let mut problem = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let parent = stack.last().map(String::as_str);
                if name == "item" && item_depth.is_none() {
                    item_depth = Some(stack.len() + 1);
                    draft = ItemDraft::default();
                } else if field.is_none()
                    && (item_depth == Some(stack.len()) || (item_depth.is_none() && parent == Some("channel")))
                {
                    field = Some((name.clone(), stack.len() + 1));
                    buf.clear();
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                let depth = stack.len();
                let name = stack.pop().unwrap_or_default();
                if let Some((field_name, field_depth)) = &field {
                    if *field_depth == depth {
                        let value = buf.trim().to_string();
                        if item_depth.is_some() {
                            draft.set(field_name, value);
                        } else if field_name == "title" && channel_title.is_none() {
                            channel_title = Some(value);
                        }
                        field = None;
                    }
                }
                if name == "item" && item_depth == Some(depth) {
                    item_depth = None;
                    match std::mem::take(&mut draft).into_record() {
                        Some(record) => records.push(record),
                        None => debug!(index = records.len(), "Skipping feed item without a usable link"),
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    buf.push_str(&unescape(&raw).unwrap_or(raw.clone()));
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if field.is_some() {
                    buf.push_str(&resolve_reference(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::Eof) => {
                if let Some(open) = stack.last() {
                    problem = Some(format!("document ends before </{open}> is closed"));
                }
                break;
            }
            Err(e) => {
                problem = Some(format!("XML error at byte {}: {e}", reader.error_position()));
                break;
            }
            _ => {}
        }
    }

    ParsedFeed {
        channel_title,
        records,
        problem,
    }
}

/// Resolve `&name;` given its name; unknown entities are kept verbatim.
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(ch) = parsed.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(resolved) = resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}
