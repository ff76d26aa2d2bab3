//! Command-line interface definitions for archive2rss.
//!
//! Flags override the YAML settings file, which overrides built-in defaults.
//! A few options can also come from environment variables.

use crate::config::Layout;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Generate the feed and print the listing
/// archive2rss
///
/// # Listing-page layout, feed written elsewhere, listing rendered to a file
/// archive2rss --layout archive-listing -o ./feeds/rss.xml --render-to ./feed.md
///
/// # Only show what was generated last time
/// archive2rss --skip-generate
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where the RSS document is written and read back from
    #[arg(short, long, env = "FEED_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Archive listing URL to scrape
    #[arg(long, env = "ARCHIVE_URL")]
    pub archive_url: Option<String>,

    /// Page layout of the archive
    #[arg(long, value_enum)]
    pub layout: Option<Layout>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Reuse a successful generation for this many seconds
    #[arg(long)]
    pub cache_secs: Option<u64>,

    /// Write the rendered listing to this file instead of stdout
    #[arg(long)]
    pub render_to: Option<PathBuf>,

    /// Number of times to load and render the feed
    #[arg(long, default_value_t = 1)]
    pub reloads: u32,

    /// Pause between loads, in seconds
    #[arg(long, default_value_t = 60)]
    pub reload_interval_secs: u64,

    /// Render the persisted feed without scraping
    #[arg(long)]
    pub skip_generate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["archive2rss"]);
        assert_eq!(cli.reloads, 1);
        assert_eq!(cli.reload_interval_secs, 60);
        assert!(!cli.skip_generate);
        assert!(cli.layout.is_none());
        assert!(cli.render_to.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["archive2rss", "-c", "/tmp/a2r.yaml", "-o", "/tmp/rss.xml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a2r.yaml")));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/rss.xml")));
    }

    #[test]
    fn test_cli_layout_value() {
        let cli = Cli::parse_from(["archive2rss", "--layout", "article-pages", "--skip-generate"]);
        assert_eq!(cli.layout, Some(Layout::ArticlePages));
        assert!(cli.skip_generate);
    }
}
