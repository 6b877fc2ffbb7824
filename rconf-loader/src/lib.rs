//! Remote configuration loading: connect, scan, classify, dispatch.
//!
//! A load opens exactly one store connection through [`connect`], scans every
//! key under the configured prefix with a [`KeyScanner`], and hands each
//! classified entry to a caller-supplied [`ConfigSink`]. The connection is
//! owned by the load and released on every exit path, including when the
//! load future is dropped by an external timeout.

#![warn(missing_docs, clippy::pedantic)]

mod connector;
mod materializer;
mod scanner;
mod sink;

use rconf_config::{ConnectionSettings, RawSettings};
use rconf_primitives::LoadResult;
use rconf_store::StoreConnector;

pub use connector::connect;
pub use materializer::FileMaterializer;
pub use scanner::{KeyScanner, ScanReport, SkipReason, SkippedKey};
pub use sink::{CollectingSink, ConfigSink, FnSink, SinkError, SinkResult, fn_sink};

/// Connects with `settings`, scans the store, and feeds `sink`.
///
/// # Errors
///
/// Returns the first fatal [`LoadError`](rconf_primitives::LoadError); see
/// [`connect`] and [`KeyScanner::scan`].
pub async fn load<C, S>(
    connector: &C,
    settings: &ConnectionSettings,
    sink: &mut S,
) -> LoadResult<ScanReport>
where
    C: StoreConnector,
    S: ConfigSink + ?Sized,
{
    let mut connection = connect(connector, settings).await?;
    KeyScanner::from_settings(settings)
        .scan(&mut connection, sink)
        .await
}

/// Validates `raw` and then performs [`load`]. Nothing touches the store when
/// validation fails.
///
/// # Errors
///
/// Returns [`LoadError::Validation`](rconf_primitives::LoadError::Validation)
/// for bad settings, otherwise the errors of [`load`].
pub async fn load_raw<C, S>(
    connector: &C,
    raw: RawSettings,
    sink: &mut S,
) -> LoadResult<ScanReport>
where
    C: StoreConnector,
    S: ConfigSink + ?Sized,
{
    let settings = raw.resolve()?;
    load(connector, &settings, sink).await
}
