//! Archive scraping: HTTP fetching, field extraction and the source-site scraper.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`http`] | Client construction and single-page GET with timeout |
//! | [`extract`] | Pure HTML → [`ArticleRecord`](crate::models::ArticleRecord) field extraction |
//! | [`neosherlock`] | Index + fetch flow for the Neosherlock archive |
//!
//! The scraper follows a two-phase pattern:
//!
//! 1. **Indexing**: discover article URLs (or entries) on the archive page
//! 2. **Fetching**: download and extract each article, skipping failures

pub mod extract;
pub mod http;
pub mod neosherlock;
