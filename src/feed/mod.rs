//! The RSS document: serialization, persistence and reading it back.
//!
//! # Submodules
//!
//! - [`writer`]: records + channel metadata → RSS 2.0 bytes
//! - [`store`]: atomic write-then-rename of the document
//! - [`reader`]: tolerant parsing of a persisted document into records
//!
//! The generator never hands its records to the renderer directly; what is
//! shown is always what [`reader::read_feed`] recovers from the file.

pub mod reader;
pub mod store;
pub mod writer;
