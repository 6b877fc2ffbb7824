//! In-process store used for tests and local development.
//!
//! [`MemoryStore`] mimics the observable behavior of a Redis server for the
//! commands in the store protocol, records every call, and can be told to
//! fail in specific ways.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::glob::glob_match;
use crate::traits::{KeyValueStore, StoreConnector, StoreError, StoreResult};

const DEFAULT_DATABASES: u32 = 16;

/// Protocol call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// A connection was dialled.
    Connect {
        /// Requested host.
        host: String,
        /// Requested port.
        port: u16,
    },
    /// Health check.
    IsConnected,
    /// Authentication attempt (the password itself is not recorded).
    Authenticate,
    /// Logical database selection.
    SelectDatabase(u32),
    /// Key enumeration with the given pattern.
    Keys(String),
    /// Value fetch for the given key.
    Get(String),
    /// A connection was released.
    Close,
}

#[derive(Debug, Default)]
struct Faults {
    refuse_connections: bool,
    report_disconnected: bool,
    fail_enumeration: Option<String>,
    failing_gets: BTreeMap<String, String>,
    vanishing_keys: BTreeSet<String>,
}

#[derive(Debug)]
struct MemoryInner {
    databases: BTreeMap<u32, BTreeMap<String, String>>,
    binary_keys: BTreeSet<Vec<u8>>,
    database_count: u32,
    password: Option<String>,
    faults: Faults,
    calls: Vec<StoreCall>,
    open_connections: usize,
}

/// Shared in-memory store; clones observe the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Creates an empty store with sixteen logical databases and no password.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                databases: BTreeMap::new(),
                binary_keys: BTreeSet::new(),
                database_count: DEFAULT_DATABASES,
                password: None,
                faults: Faults::default(),
                calls: Vec::new(),
                open_connections: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key` in database `0`.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_in(0, key, value);
    }

    /// Stores `value` under `key` in the given logical database.
    pub fn insert_in(&self, db: u32, key: impl Into<String>, value: impl Into<String>) {
        self.lock()
            .databases
            .entry(db)
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Adds a key made of arbitrary bytes to database `0`. Such keys are
    /// listed by enumeration but hold no value.
    pub fn insert_binary_key(&self, key: impl Into<Vec<u8>>) {
        self.lock().binary_keys.insert(key.into());
    }

    /// Requires clients to authenticate with `password`.
    pub fn require_password(&self, password: impl Into<String>) {
        self.lock().password = Some(password.into());
    }

    /// Limits the number of logical databases.
    pub fn set_database_count(&self, count: u32) {
        self.lock().database_count = count;
    }

    /// Makes every connection attempt fail at the transport level.
    pub fn refuse_connections(&self) {
        self.lock().faults.refuse_connections = true;
    }

    /// Makes connections report themselves as not connected.
    pub fn report_disconnected(&self) {
        self.lock().faults.report_disconnected = true;
    }

    /// Makes key enumeration fail with `reason`.
    pub fn fail_enumeration(&self, reason: impl Into<String>) {
        self.lock().faults.fail_enumeration = Some(reason.into());
    }

    /// Makes fetching `key` fail with `reason`.
    pub fn fail_get(&self, key: impl Into<String>, reason: impl Into<String>) {
        self.lock()
            .faults
            .failing_gets
            .insert(key.into(), reason.into());
    }

    /// Keeps `key` in enumerations but answers `None` when it is fetched,
    /// as if it expired between the two calls.
    pub fn vanish_on_get(&self, key: impl Into<String>) {
        self.lock().faults.vanishing_keys.insert(key.into());
    }

    /// Returns every protocol call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Returns the number of connections currently open.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.lock().open_connections
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    type Connection = MemoryConnection;

    async fn connect(&self, host: &str, port: u16) -> StoreResult<MemoryConnection> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Connect {
            host: host.to_owned(),
            port,
        });
        if inner.faults.refuse_connections {
            return Err(StoreError::connect(host, port, "connection refused"));
        }
        inner.open_connections += 1;
        let authenticated = inner.password.is_none();
        debug!(host, port, "memory store connection opened");

        Ok(MemoryConnection {
            store: self.clone(),
            db: 0,
            authenticated,
        })
    }
}

/// Connection to a [`MemoryStore`]; dropping it releases the connection.
#[derive(Debug)]
pub struct MemoryConnection {
    store: MemoryStore,
    db: u32,
    authenticated: bool,
}

impl MemoryConnection {
    fn ensure_authenticated(&self, command: &'static str) -> StoreResult<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(StoreError::command(command, "NOAUTH Authentication required."))
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryConnection {
    async fn is_connected(&mut self) -> bool {
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::IsConnected);
        !inner.faults.report_disconnected
    }

    async fn authenticate(&mut self, password: &str) -> StoreResult<()> {
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::Authenticate);
        match inner.password.as_deref() {
            None => Err(StoreError::command(
                "AUTH",
                "ERR AUTH called without any password configured for the default user",
            )),
            Some(expected) if expected == password => {
                self.authenticated = true;
                Ok(())
            }
            Some(_) => Err(StoreError::command(
                "AUTH",
                "WRONGPASS invalid username-password pair or user is disabled.",
            )),
        }
    }

    async fn select_database(&mut self, index: u32) -> StoreResult<()> {
        self.ensure_authenticated("SELECT")?;
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::SelectDatabase(index));
        if index >= inner.database_count {
            return Err(StoreError::command("SELECT", "ERR DB index is out of range"));
        }
        self.db = index;
        Ok(())
    }

    async fn keys(&mut self, pattern: &str) -> StoreResult<Vec<Vec<u8>>> {
        self.ensure_authenticated("KEYS")?;
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::Keys(pattern.to_owned()));
        if let Some(reason) = &inner.faults.fail_enumeration {
            return Err(StoreError::command("KEYS", reason.clone()));
        }
        let mut keys: Vec<Vec<u8>> = inner
            .databases
            .get(&self.db)
            .map(|db| {
                db.keys()
                    .filter(|key| glob_match(pattern, key))
                    .map(|key| key.clone().into_bytes())
                    .collect()
            })
            .unwrap_or_default();
        if self.db == 0 {
            keys.extend(
                inner
                    .binary_keys
                    .iter()
                    .filter(|key| glob_match(pattern, &String::from_utf8_lossy(key)))
                    .cloned(),
            );
        }
        Ok(keys)
    }

    async fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        self.ensure_authenticated("GET")?;
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::Get(key.to_owned()));
        if let Some(reason) = inner.faults.failing_gets.get(key) {
            return Err(StoreError::command("GET", reason.clone()));
        }
        if inner.faults.vanishing_keys.contains(key) {
            return Ok(None);
        }
        Ok(inner
            .databases
            .get(&self.db)
            .and_then(|db| db.get(key))
            .cloned())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        inner.calls.push(StoreCall::Close);
        inner.open_connections = inner.open_connections.saturating_sub(1);
    }
}
