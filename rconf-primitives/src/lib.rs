//! Core shared types for remote configuration loading.
//!
//! These types are pure: no I/O happens here. Store access and sink dispatch
//! live in `rconf-store` and `rconf-loader`.

#![warn(missing_docs, clippy::pedantic)]

mod entry;
mod envelope;
mod error;
mod key;

/// Classified entries handed to sinks.
pub use entry::ClassifiedEntry;
/// File envelope format and value classification.
pub use envelope::{
    Classification, EnvelopeError, FILE_MARKER, FilePayload, PATH_DELIMITER, classify, is_file,
};
/// Error type and result alias shared across the loader.
pub use error::{LoadError, LoadResult};
/// Normalized configuration keys.
pub use key::{
    ConfigKey, KeyRejection, PATH_SEPARATOR, escape_glob, is_leading_char, scan_pattern,
};
