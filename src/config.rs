//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line flags and environment variables (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! archive_url: https://www.neosherlock.com/archives
//! layout: archive-listing
//! entry_selector: "article.post"
//! output: ./feeds/neosherlock_rss.xml
//! cache_secs: 1800
//! feed:
//!   title: 셜록 Archives
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::FeedMeta;
use crate::scrapers::extract::ExtractRules;
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_ARCHIVE_URL: &str = "https://www.neosherlock.com/archives";
pub const DEFAULT_LINK_PATTERN: &str = r"^https?://www\.neosherlock\.com/archives/\d+$";
pub const DEFAULT_OUTPUT: &str = "neosherlock_rss.xml";
pub const DEFAULT_FEED_TITLE: &str = "셜록 Archives";
pub const DEFAULT_FEED_DESCRIPTION: &str = "네오셜록 아카이브 RSS 피드";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How the source archive exposes article metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// The archive only links to articles; each article page is fetched and
    /// read from its `<meta>` tags and body.
    #[default]
    ArticlePages,
    /// Every entry on the archive page carries its own title, byline,
    /// `YYYY.MM.DD` date and excerpt.
    ArchiveListing,
}

/// Feed-level overrides; unset fields fall back to the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub archive_url: String,
    pub layout: Layout,
    pub article_link_pattern: String,
    /// CSS selector for one entry (archive-listing layout only).
    pub entry_selector: String,
    pub output: PathBuf,
    pub timeout_secs: u64,
    /// Freshness window for reusing a successful generation.
    pub cache_secs: u64,
    pub user_agent: String,
    pub feed: FeedSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            layout: Layout::default(),
            article_link_pattern: DEFAULT_LINK_PATTERN.to_string(),
            entry_selector: "article".to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout_secs: 15,
            cache_secs: 3600,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            feed: FeedSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file on top of the defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?settings, "Loaded settings file");
        Ok(settings)
    }

    /// Apply command-line and environment overrides.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.archive_url {
            self.archive_url = url.clone();
        }
        if let Some(layout) = cli.layout {
            self.layout = layout;
        }
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(secs) = cli.cache_secs {
            self.cache_secs = secs;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_secs)
    }

    /// Channel metadata, defaulting the link to the archive URL.
    pub fn feed_meta(&self) -> FeedMeta {
        FeedMeta {
            title: self
                .feed
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
            link: self
                .feed
                .link
                .clone()
                .unwrap_or_else(|| self.archive_url.clone()),
            description: self
                .feed
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_FEED_DESCRIPTION.to_string()),
        }
    }

    /// Compile the link pattern and entry selector.
    pub fn extract_rules(&self) -> Result<ExtractRules, ConfigError> {
        let link_pattern = Regex::new(&self.article_link_pattern)?;
        let entry_selector = Selector::parse(&self.entry_selector)
            .map_err(|_| ConfigError::Selector(self.entry_selector.clone()))?;
        Ok(ExtractRules {
            layout: self.layout,
            link_pattern,
            entry_selector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults_match_source_site() {
        let settings = Settings::default();
        assert_eq!(settings.archive_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(settings.layout, Layout::ArticlePages);
        assert_eq!(settings.timeout(), Duration::from_secs(15));
        assert_eq!(settings.cache_window(), Duration::from_secs(3600));

        let meta = settings.feed_meta();
        assert_eq!(meta.title, DEFAULT_FEED_TITLE);
        assert_eq!(meta.link, DEFAULT_ARCHIVE_URL);
        assert_eq!(meta.description, DEFAULT_FEED_DESCRIPTION);
    }

    #[test]
    fn test_load_without_file_is_default() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "layout: archive-listing\nentry_selector: \"li.post\"\ncache_secs: 60\nfeed:\n  title: Custom"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.layout, Layout::ArchiveListing);
        assert_eq!(settings.entry_selector, "li.post");
        assert_eq!(settings.cache_secs, 60);
        assert_eq!(settings.timeout_secs, 15);
        assert_eq!(settings.feed_meta().title, "Custom");
        assert_eq!(settings.feed_meta().link, DEFAULT_ARCHIVE_URL);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/archive2rss.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "archive2rss",
            "--layout",
            "archive-listing",
            "--output",
            "/tmp/out.xml",
            "--cache-secs",
            "0",
        ]);
        let settings = Settings::default().with_cli(&cli);
        assert_eq!(settings.layout, Layout::ArchiveListing);
        assert_eq!(settings.output, PathBuf::from("/tmp/out.xml"));
        assert_eq!(settings.cache_secs, 0);
    }

    #[test]
    fn test_bad_selector_is_config_error() {
        let settings = Settings {
            entry_selector: "<<<".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.extract_rules(),
            Err(ConfigError::Selector(_))
        ));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let settings = Settings {
            article_link_pattern: "(".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.extract_rules(),
            Err(ConfigError::LinkPattern(_))
        ));
    }
}
