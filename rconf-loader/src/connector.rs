//! Opens an authenticated connection for a single load.

use rconf_config::ConnectionSettings;
use rconf_primitives::{LoadError, LoadResult};
use rconf_store::{KeyValueStore, StoreConnector};
use tracing::debug;

/// Opens one connection and prepares it for scanning.
///
/// The connection is health-checked, authenticated when a password is
/// configured, and switched to the configured logical database when it is not
/// the default one. There is no retry: any failure aborts the load and the
/// partially prepared connection is dropped, which releases it.
///
/// # Errors
///
/// - [`LoadError::Connection`] when the transport fails or the store reports
///   itself as not connected.
/// - [`LoadError::Authentication`] when the password is rejected.
/// - [`LoadError::DatabaseSelection`] when the database cannot be selected.
pub async fn connect<C>(connector: &C, settings: &ConnectionSettings) -> LoadResult<C::Connection>
where
    C: StoreConnector,
{
    let mut connection = connector
        .connect(settings.host(), settings.port())
        .await
        .map_err(|err| LoadError::connection(err.to_string()))?;

    if !connection.is_connected().await {
        return Err(LoadError::connection(format!(
            "{}:{} reports not connected",
            settings.host(),
            settings.port()
        )));
    }
    debug!(host = settings.host(), port = settings.port(), "store connected");

    if let Some(password) = settings.password() {
        connection
            .authenticate(password)
            .await
            .map_err(|err| LoadError::authentication(err.to_string()))?;
        debug!("store authenticated");
    }

    let db = settings.db_index();
    if db > 0 {
        connection
            .select_database(db)
            .await
            .map_err(|err| LoadError::database_selection(db, err.to_string()))?;
        debug!(db, "store database selected");
    }

    Ok(connection)
}
