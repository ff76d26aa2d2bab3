//! Presentation of the feed.
//!
//! # Submodules
//!
//! - [`markdown`]: renders a [`DisplayState`](crate::pipeline::DisplayState)
//!   as a newest-first Markdown page
//!
//! The renderer only sees what was read back from the feed file, plus any
//! notices about stale or partially recovered content.

pub mod markdown;
