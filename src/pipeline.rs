//! Generation pipeline and the state handed to the renderer.
//!
//! Generation is fetch → extract → serialize → write. Display always goes
//! through the persisted file: [`display_state`] combines the outcome of the
//! latest generation attempt with what [`read_feed`](crate::feed::reader::read_feed)
//! recovered, so that a failed refresh falls back to the previous document.

use crate::config::Settings;
use crate::error::{ConfigError, FeedReadError, GenerateError};
use crate::feed::reader::FeedLoad;
use crate::feed::{store, writer};
use crate::models::{ArticleRecord, FeedMeta};
use crate::scrapers::extract::ExtractRules;
use crate::scrapers::neosherlock;
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

/// Everything one generation pass needs.
#[derive(Debug)]
pub struct Pipeline {
    client: Client,
    archive_url: String,
    rules: ExtractRules,
    meta: FeedMeta,
    output: PathBuf,
}

impl Pipeline {
    pub fn new(settings: &Settings, client: Client) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            archive_url: settings.archive_url.clone(),
            rules: settings.extract_rules()?,
            meta: settings.feed_meta(),
            output: settings.output.clone(),
        })
    }

    /// Path of the persisted feed document.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Scrape the archive and overwrite the feed file.
    ///
    /// Returns the records in extraction order. On any error nothing is
    /// written and the previous file stays in place.
    #[instrument(level = "info", skip_all, fields(archive_url = %self.archive_url, output = %self.output.display()))]
    pub async fn generate(&self) -> Result<Vec<ArticleRecord>, GenerateError> {
        let t0 = Instant::now();
        let records = neosherlock::scrape(&self.client, &self.archive_url, &self.rules).await?;
        let document = writer::serialize_feed(&self.meta, &records, Utc::now())?;
        store::write_feed(&self.output, &document).await?;

        info!(
            count = records.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Generated feed"
        );
        Ok(records)
    }
}

/// What the presentation layer shows.
#[derive(Debug)]
pub enum DisplayState {
    /// Articles to list, with notices such as "stale" or "partially recovered".
    Listing {
        channel_title: Option<String>,
        records: Vec<ArticleRecord>,
        notices: Vec<String>,
    },
    /// The feed was read but holds no articles.
    Empty {
        channel_title: Option<String>,
        notices: Vec<String>,
    },
    /// Nothing can be listed.
    Failed { message: String },
}

/// Combine the latest generation attempt (if any) with the read-back result.
pub fn display_state(
    generation: Option<&Result<Vec<ArticleRecord>, GenerateError>>,
    read: Result<FeedLoad, FeedReadError>,
) -> DisplayState {
    let generation_error = generation.and_then(|result| result.as_ref().err());

    match read {
        Ok(load) => {
            let mut notices = Vec::new();
            if let Some(e) = generation_error {
                notices.push(format!(
                    "Could not refresh the feed ({e}); showing the last saved version."
                ));
            }
            if let Some(warning) = load.warning {
                notices.push(format!(
                    "The saved feed is damaged ({warning}); showing the articles that could be recovered."
                ));
            }
            if load.records.is_empty() {
                DisplayState::Empty {
                    channel_title: load.channel_title,
                    notices,
                }
            } else {
                DisplayState::Listing {
                    channel_title: load.channel_title,
                    records: load.records,
                    notices,
                }
            }
        }
        Err(FeedReadError::NotFound(path)) => DisplayState::Failed {
            message: match generation {
                Some(Err(e)) => {
                    format!("Feed generation failed ({e}) and no saved feed exists yet.")
                }
                Some(Ok(_)) => format!(
                    "The feed was just written to {} but is no longer there.",
                    path.display()
                ),
                None => format!("No feed has been generated yet at {}.", path.display()),
            },
        },
        Err(e @ FeedReadError::Unreadable { .. }) => DisplayState::Failed {
            message: format!("The saved feed could not be read: {e}"),
        },
        Err(e @ FeedReadError::Malformed { .. }) => DisplayState::Failed {
            message: format!("The saved feed is malformed and no articles could be recovered: {e}"),
        },
    }
}
