//! Connection settings for remote configuration providers.
//!
//! Settings are read from a configuration object into [`RawSettings`] and
//! validated into [`ConnectionSettings`] before any connection is attempted.

#![warn(missing_docs, clippy::pedantic)]

mod settings;

pub use settings::{
    ConnectionSettings, ConnectionSettingsBuilder, DEFAULT_SEPARATOR, IntSetting, RawSettings,
};
