//! Redis configuration provider.

use std::fmt;

use rconf_config::{ConnectionSettings, RawSettings};
use rconf_loader::{ConfigSink, ScanReport};
use rconf_primitives::{LoadError, LoadResult};
use rconf_store::{RedisConnector, StoreConnector};
use serde_json::Value;
use tracing::info;

/// Loads configuration from a Redis keyspace.
///
/// The connector is generic so the provider can run against any
/// [`StoreConnector`], such as [`rconf_store::MemoryStore`] in tests.
#[derive(Clone)]
pub struct RedisProvider<C = RedisConnector> {
    connector: C,
}

impl RedisProvider<RedisConnector> {
    /// Creates a provider talking to Redis.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connector: RedisConnector::new(),
        }
    }
}

impl Default for RedisProvider<RedisConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for RedisProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisProvider")
            .field("name", &PROVIDER_NAME)
            .field("version", &PROVIDER_VERSION)
            .finish_non_exhaustive()
    }
}

/// Stable provider name.
pub const PROVIDER_NAME: &str = "redis";

/// Provider version, taken from the crate metadata.
pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

impl<C: StoreConnector> RedisProvider<C> {
    /// Creates a provider using a custom connector.
    #[must_use]
    pub const fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    /// Returns the stable provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Returns the provider version.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        PROVIDER_VERSION
    }

    /// Returns the name of the configuration section holding the settings.
    #[must_use]
    pub const fn configuration_object_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Returns the underlying connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Reads the provider section of `root`, validates it, and loads every
    /// entry into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Validation`] for field `redis` when the section is
    /// missing or not an object, any settings validation error, and the
    /// connection and scan errors of [`rconf_loader::load`].
    pub async fn load_data<S>(&self, root: &Value, sink: &mut S) -> LoadResult<ScanReport>
    where
        S: ConfigSink + ?Sized,
    {
        let section = root
            .get(self.configuration_object_name())
            .filter(|section| section.is_object())
            .ok_or_else(|| {
                LoadError::validation(PROVIDER_NAME, "missing provider configuration section")
            })?;
        let settings = RawSettings::from_value(section)?.resolve()?;
        self.load_settings(&settings, sink).await
    }

    /// Loads every entry into `sink` using already validated settings.
    ///
    /// # Errors
    ///
    /// See [`rconf_loader::load`].
    pub async fn load_settings<S>(
        &self,
        settings: &ConnectionSettings,
        sink: &mut S,
    ) -> LoadResult<ScanReport>
    where
        S: ConfigSink + ?Sized,
    {
        info!(
            provider = PROVIDER_NAME,
            version = PROVIDER_VERSION,
            host = settings.host(),
            port = settings.port(),
            "loading remote configuration"
        );
        rconf_loader::load(&self.connector, settings, sink).await
    }
}
