//! Error taxonomy shared by every stage of a configuration load.

use thiserror::Error;

/// Result alias used by load operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Failures that abort a configuration load.
///
/// Every variant carries enough context (the offending settings field or the
/// store's own message) to diagnose the failure without retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Input settings were rejected before any I/O took place.
    #[error("invalid setting `{field}`: {reason}")]
    Validation {
        /// Name of the offending settings field.
        field: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The store could not be reached or reported itself unhealthy.
    #[error("cannot connect to the provider: {reason}")]
    Connection {
        /// Transport-level context.
        reason: String,
    },

    /// The store rejected the configured credentials.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Message reported by the store.
        reason: String,
    },

    /// The requested logical database could not be selected.
    #[error("cannot select database {index}: {reason}")]
    DatabaseSelection {
        /// Requested database index.
        index: u32,
        /// Message reported by the store.
        reason: String,
    },

    /// Key enumeration failed; the key set is unusable.
    #[error("key scan failed: {reason}")]
    Scan {
        /// Message reported by the store.
        reason: String,
    },

    /// A caller-supplied sink refused an entry.
    #[error("sink rejected `{key}`: {reason}")]
    Sink {
        /// Normalized key of the rejected entry.
        key: String,
        /// Reason reported by the sink.
        reason: String,
    },
}

impl LoadError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Convenience constructor for connection failures.
    #[must_use]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for authentication failures.
    #[must_use]
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for database selection failures.
    #[must_use]
    pub fn database_selection(index: u32, reason: impl Into<String>) -> Self {
        Self::DatabaseSelection {
            index,
            reason: reason.into(),
        }
    }

    /// Convenience constructor for enumeration failures.
    #[must_use]
    pub fn scan(reason: impl Into<String>) -> Self {
        Self::Scan {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for sink failures.
    #[must_use]
    pub fn sink(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Sink {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns the offending settings field for validation failures.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns `true` when the failure happened before any network I/O.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_exposes_field() {
        let err = LoadError::validation("port", "invalid port number");
        assert_eq!(err.field(), Some("port"));
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid setting `port`: invalid port number");
    }

    #[test]
    fn non_validation_has_no_field() {
        let err = LoadError::database_selection(3, "ERR DB index is out of range");
        assert_eq!(err.field(), None);
        assert_eq!(
            err.to_string(),
            "cannot select database 3: ERR DB index is out of range"
        );
    }
}
