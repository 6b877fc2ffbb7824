//! Remote configuration from Redis.
//!
//! [`RedisProvider::load_data`] reads the `redis` section of an application
//! configuration, connects to the store, and emits every key under the
//! configured prefix as either a scalar value or a file to a [`ConfigSink`].
//!
//! ```no_run
//! use rconf_redis::{CollectingSink, RedisProvider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), rconf_redis::LoadError> {
//! let root = json!({
//!     "redis": { "host": "localhost", "port": 6379, "prefix": "myapp" }
//! });
//! let mut sink = CollectingSink::new();
//! RedisProvider::new().load_data(&root, &mut sink).await?;
//! println!("{:?}", sink.value("db.default.driver"));
//! # Ok(())
//! # }
//! ```
//!
//! The building blocks are re-exported for callers that need finer control.

#![warn(missing_docs, clippy::pedantic)]

mod provider;

pub use provider::{PROVIDER_NAME, PROVIDER_VERSION, RedisProvider};

/// Shared primitives: keys, entries, envelopes, errors.
pub use rconf_primitives as primitives;
pub use rconf_primitives::{ClassifiedEntry, ConfigKey, FilePayload, LoadError, LoadResult};

/// Settings resolution.
pub use rconf_config as config;
pub use rconf_config::{ConnectionSettings, RawSettings};

/// Store protocol and backends.
pub use rconf_store as store;

/// Connection, scan, and sinks.
pub use rconf_loader as loader;
pub use rconf_loader::{
    CollectingSink, ConfigSink, FileMaterializer, ScanReport, SinkError, SinkResult, fn_sink,
};
