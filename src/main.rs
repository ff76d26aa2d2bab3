//! # archive2rss
//!
//! Scrapes a news archive page, turns its articles into an RSS 2.0 feed
//! file and renders that file back as a newest-first Markdown listing.
//!
//! ## Usage
//!
//! ```sh
//! archive2rss -o ./neosherlock_rss.xml --render-to ./latest.md
//! archive2rss --reloads 3 --reload-interval-secs 600
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: find article links on the archive page (or read entries in place)
//! 2. **Fetching**: download and extract each article
//! 3. **Feed**: serialize RSS 2.0 and atomically replace the feed file
//! 4. **Display**: read the file back tolerantly and render it
//!
//! Steps 1–3 are memoized for the configured window (one hour by default), so
//! repeated loads within that window reuse the file on disk.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod error;
mod feed;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cache::GenerationCache;
use cli::Cli;
use config::Settings;
use feed::reader::read_feed;
use outputs::markdown::render_page;
use pipeline::{display_state, Pipeline};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("archive2rss starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.output, reloads = args.reloads, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?.with_cli(&args);
    info!(
        archive_url = %settings.archive_url,
        layout = ?settings.layout,
        output = %settings.output.display(),
        cache_secs = settings.cache_secs,
        "Settings resolved"
    );

    let client = scrapers::http::build_client(settings.timeout(), &settings.user_agent)?;
    let pipeline = Pipeline::new(&settings, client)?;
    let meta = settings.feed_meta();
    let mut cache = GenerationCache::new(settings.cache_window());

    for load in 1..=args.reloads.max(1) {
        if load > 1 {
            tokio::time::sleep(Duration::from_secs(args.reload_interval_secs)).await;
        }

        let generation = if args.skip_generate {
            None
        } else {
            Some(cache.get_or_refresh(|| pipeline.generate()).await)
        };
        match &generation {
            Some(Ok(records)) => info!(load, count = records.len(), "Feed is current"),
            Some(Err(e)) => error!(load, error = %e, "Generation failed; falling back to saved feed"),
            None => debug!(load, "Generation skipped"),
        }

        let state = display_state(generation.as_ref(), read_feed(pipeline.output()).await);
        let page = render_page(&meta.title, state);

        match &args.render_to {
            Some(path) => {
                if let Err(e) = tokio::fs::write(path, &page).await {
                    error!(path = %path.display(), error = %e, "Failed writing rendered page");
                } else {
                    info!(path = %path.display(), "Wrote rendered page");
                }
            }
            None => print!("{page}"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
