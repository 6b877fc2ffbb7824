//! Redis backend built on the `redis` crate's multiplexed tokio connection.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::traits::{KeyValueStore, StoreConnector, StoreError, StoreResult};

const DEFAULT_SCAN_COUNT: usize = 500;

/// Opens Redis connections.
#[derive(Debug, Clone, Copy)]
pub struct RedisConnector {
    scan_count: usize,
}

impl RedisConnector {
    /// Creates a connector with the default `SCAN` batch hint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// Sets the `COUNT` hint sent with every `SCAN` call.
    #[must_use]
    pub const fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count;
        self
    }
}

impl Default for RedisConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreConnector for RedisConnector {
    type Connection = RedisConnection;

    async fn connect(&self, host: &str, port: u16) -> StoreResult<RedisConnection> {
        let client = redis::Client::open((host.to_owned(), port))
            .map_err(|err| StoreError::connect(host, port, err.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| StoreError::connect(host, port, err.to_string()))?;
        debug!(host, port, "redis connection opened");

        Ok(RedisConnection {
            connection,
            scan_count: self.scan_count,
        })
    }
}

/// Open Redis connection. Dropping it closes the socket.
pub struct RedisConnection {
    connection: MultiplexedConnection,
    scan_count: usize,
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnection")
            .field("scan_count", &self.scan_count)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for RedisConnection {
    /// Any reply to `PING`, including an error such as `NOAUTH` from a server
    /// that requires a password, proves the link is up. Only transport
    /// failures count as disconnected.
    async fn is_connected(&mut self) -> bool {
        let reply: redis::RedisResult<redis::Value> = redis::cmd("PING")
            .query_async(&mut self.connection)
            .await;
        match reply {
            Ok(_) => true,
            Err(err) => {
                let lost = err.is_io_error()
                    || err.is_connection_dropped()
                    || err.is_connection_refusal()
                    || err.is_timeout();
                debug!(%err, lost, "health check answered with an error");
                !lost
            }
        }
    }

    async fn authenticate(&mut self, password: &str) -> StoreResult<()> {
        let (): () = redis::cmd("AUTH")
            .arg(password)
            .query_async(&mut self.connection)
            .await
            .map_err(|err| StoreError::command("AUTH", err.to_string()))?;
        Ok(())
    }

    async fn select_database(&mut self, index: u32) -> StoreResult<()> {
        let (): () = redis::cmd("SELECT")
            .arg(index)
            .query_async(&mut self.connection)
            .await
            .map_err(|err| StoreError::command("SELECT", err.to_string()))?;
        Ok(())
    }

    /// Walks the keyspace with `SCAN MATCH` so the server is never blocked by
    /// a full `KEYS` traversal. `SCAN` may repeat keys; duplicates are dropped.
    async fn keys(&mut self, pattern: &str) -> StoreResult<Vec<Vec<u8>>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query_async(&mut self.connection)
                .await
                .map_err(|err| StoreError::command("SCAN", err.to_string()))?;

            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    async fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection)
            .await
            .map_err(|err| StoreError::command("GET", err.to_string()))
    }
}
