//! Store protocol shared by every backend.

use async_trait::async_trait;
use thiserror::Error;

/// Result alias used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The transport could not be established.
    #[error("connection to {endpoint} failed: {reason}")]
    Connect {
        /// `host:port` that was dialled.
        endpoint: String,
        /// Transport-level context.
        reason: String,
    },

    /// The store answered a command with an error.
    #[error("{command} failed: {reason}")]
    Command {
        /// Command name (e.g. `AUTH`).
        command: &'static str,
        /// Message reported by the store.
        reason: String,
    },
}

impl StoreError {
    /// Convenience constructor for connection failures.
    #[must_use]
    pub fn connect(host: &str, port: u16, reason: impl Into<String>) -> Self {
        Self::Connect {
            endpoint: format!("{host}:{port}"),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for command failures.
    #[must_use]
    pub fn command(command: &'static str, reason: impl Into<String>) -> Self {
        Self::Command {
            command,
            reason: reason.into(),
        }
    }
}

/// Opens connections to a key/value store.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connection type produced by this connector.
    type Connection: KeyValueStore;

    /// Opens one connection to `host:port`.
    ///
    /// Dropping the returned connection releases it.
    async fn connect(&self, host: &str, port: u16) -> StoreResult<Self::Connection>;
}

/// An open, exclusively owned connection to a key/value store.
#[async_trait]
pub trait KeyValueStore: Send {
    /// Returns `true` when the connection is usable.
    async fn is_connected(&mut self) -> bool;

    /// Authenticates the connection.
    async fn authenticate(&mut self, password: &str) -> StoreResult<()>;

    /// Selects a logical database.
    async fn select_database(&mut self, index: u32) -> StoreResult<()>;

    /// Returns every key matching a glob `pattern`, in store order.
    ///
    /// Keys are returned as raw bytes since store keys are binary safe; the
    /// caller decides what to do with keys that are not UTF-8.
    async fn keys(&mut self, pattern: &str) -> StoreResult<Vec<Vec<u8>>>;

    /// Fetches the string value of `key`; `None` when the key is absent.
    async fn get(&mut self, key: &str) -> StoreResult<Option<String>>;
}
