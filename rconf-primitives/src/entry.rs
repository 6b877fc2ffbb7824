//! Classified configuration entries emitted by a scan.

use crate::envelope::FilePayload;
use crate::key::ConfigKey;

/// A store entry once its key is normalized and its value classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEntry {
    /// Plain configuration value.
    KeyValue {
        /// Normalized key.
        key: ConfigKey,
        /// Literal value as stored.
        value: String,
    },
    /// File-backed configuration entry.
    File {
        /// Normalized key.
        key: ConfigKey,
        /// Decoded file payload.
        payload: FilePayload,
    },
}

impl ClassifiedEntry {
    /// Returns the normalized key.
    #[must_use]
    pub const fn key(&self) -> &ConfigKey {
        match self {
            Self::KeyValue { key, .. } | Self::File { key, .. } => key,
        }
    }

    /// Returns `true` for file entries.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}
