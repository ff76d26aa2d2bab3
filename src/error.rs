//! Error types for fetching, feed I/O and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Transport failures while fetching a page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failures while serializing or persisting the feed document.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while loading a persisted feed document.
///
/// `NotFound` is kept apart from the other variants so callers can tell
/// "nothing generated yet" from "something is wrong with the file".
#[derive(Error, Debug)]
pub enum FeedReadError {
    #[error("feed file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("feed file {} could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feed file {} is malformed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// A failed generation attempt. The previously persisted feed stays authoritative.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("feed output failed: {0}")]
    Feed(#[from] FeedError),
}

/// Invalid or unreadable settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid article link pattern: {0}")]
    LinkPattern(#[from] regex::Error),

    #[error("invalid CSS selector `{0}`")]
    Selector(String),
}
