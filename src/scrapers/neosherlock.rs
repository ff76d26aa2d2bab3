//! Neosherlock archive scraper.
//!
//! This module scrapes the [Neosherlock archive](https://www.neosherlock.com/archives)
//! in one of two layouts (see [`Layout`]):
//!
//! - **Article pages**: the archive is only an index. Links matching
//!   `https://www.neosherlock.com/archives/<id>` are collected and each
//!   article page is fetched in turn.
//! - **Archive listing**: every entry on the archive page already carries
//!   its metadata, so a single fetch is enough.
//!
//! Pages are fetched one after another. A failed archive fetch aborts the
//! run; a failed article fetch only drops that article.

use crate::config::Layout;
use crate::error::FetchError;
use crate::models::ArticleRecord;
use crate::scrapers::extract::{self, ExtractRules};
use crate::scrapers::http::fetch_html;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Scrape the archive at `archive_url` into records, in extraction order.
#[instrument(level = "info", skip(client, rules), fields(layout = ?rules.layout))]
pub async fn scrape(
    client: &Client,
    archive_url: &str,
    rules: &ExtractRules,
) -> Result<Vec<ArticleRecord>, FetchError> {
    match rules.layout {
        Layout::ArticlePages => {
            let urls = index_articles(client, archive_url, rules).await?;
            Ok(fetch_articles(client, urls).await)
        }
        Layout::ArchiveListing => scrape_listing(client, archive_url, rules).await,
    }
}

/// Collect article URLs from the archive page.
#[instrument(level = "info", skip(client, rules))]
pub async fn index_articles(
    client: &Client,
    archive_url: &str,
    rules: &ExtractRules,
) -> Result<Vec<String>, FetchError> {
    let base = Url::parse(archive_url)?;
    let html = fetch_html(client, archive_url).await?;
    let document = Html::parse_document(&html);
    let urls = extract::archive_links(&document, &base, &rules.link_pattern);

    info!(count = urls.len(), source = archive_url, "Indexed archive article URLs");
    debug!(urls = ?urls, "Archive URLs");
    Ok(urls)
}

/// Fetch article pages one at a time. Failed fetches are logged and skipped.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn fetch_articles(client: &Client, urls: Vec<String>) -> Vec<ArticleRecord> {
    let articles: Vec<ArticleRecord> = stream::iter(urls)
        .then(|url: String| async move {
            match fetch_article(client, &url).await {
                Ok(Some(article)) => {
                    debug!(%url, title = article.title(), author = %article.author(), "Fetched article");
                    Some(article)
                }
                Ok(None) => {
                    warn!(%url, "Article page produced no record");
                    None
                }
                Err(e) => {
                    error!(error = %e, %url, "Article fetch failed");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = articles.len(), "Fetched article pages");
    articles
}

/// Fetch and extract a single article page.
#[instrument(level = "debug", skip(client))]
async fn fetch_article(client: &Client, url: &str) -> Result<Option<ArticleRecord>, FetchError> {
    let body = fetch_html(client, url).await?;
    let document = Html::parse_document(&body);
    Ok(extract::extract_article_page(&document, url))
}

/// Fetch the archive page and extract every entry from it.
async fn scrape_listing(
    client: &Client,
    archive_url: &str,
    rules: &ExtractRules,
) -> Result<Vec<ArticleRecord>, FetchError> {
    let base = Url::parse(archive_url)?;
    let html = fetch_html(client, archive_url).await?;
    let document = Html::parse_document(&html);
    let records = extract::extract_listing(&document, &base, rules);

    info!(count = records.len(), source = archive_url, "Extracted archive listing entries");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::scrapers::http::build_client;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scrape_fails_closed_when_archive_unreachable() {
        let settings = Settings {
            archive_url: "http://127.0.0.1:9/archives".to_string(),
            ..Settings::default()
        };
        let client = build_client(Duration::from_millis(500), "archive2rss-test").unwrap();
        let rules = settings.extract_rules().unwrap();

        let result = scrape(&client, &settings.archive_url, &rules).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scrape_rejects_invalid_archive_url() {
        let client = build_client(Duration::from_millis(500), "archive2rss-test").unwrap();
        let rules = Settings::default().extract_rules().unwrap();

        let result = scrape(&client, "not a url", &rules).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_articles_skips_failures() {
        let client = build_client(Duration::from_millis(500), "archive2rss-test").unwrap();
        let records = fetch_articles(
            &client,
            vec![
                "http://127.0.0.1:9/archives/1".to_string(),
                "http://127.0.0.1:9/archives/2".to_string(),
            ],
        )
        .await;
        assert!(records.is_empty());
    }
}
