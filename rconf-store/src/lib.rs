//! Key/value store protocol consumed by the configuration loader.
//!
//! [`StoreConnector`] opens connections and [`KeyValueStore`] exposes the
//! handful of commands a scan needs. Two backends are provided: the
//! in-process [`MemoryStore`] and, behind the default `redis` feature,
//! [`RedisConnector`].

#![warn(missing_docs, clippy::pedantic)]

mod glob;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod traits;

pub use glob::glob_match;
pub use memory::{MemoryConnection, MemoryStore, StoreCall};
#[cfg(feature = "redis")]
pub use redis_store::{RedisConnection, RedisConnector};
pub use traits::{KeyValueStore, StoreConnector, StoreError, StoreResult};
