//! Key enumeration and classification.
//!
//! Failure policy: enumeration failures and sink failures abort the scan.
//! Any other problem with a single key (not UTF-8, empty once normalized,
//! failed or empty fetch, malformed envelope) skips that key with a warning
//! and records it in the [`ScanReport`]. Empty values are emitted as empty scalars.

use std::fmt;

use rconf_config::ConnectionSettings;
use rconf_primitives::{
    Classification, ClassifiedEntry, ConfigKey, EnvelopeError, KeyRejection, LoadError,
    LoadResult, classify, scan_pattern,
};
use rconf_store::KeyValueStore;
use tracing::{debug, info, warn};

use crate::sink::ConfigSink;

/// Why a key produced no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The store returned a key that does not start with the prefix.
    OutsidePrefix,
    /// The key is not valid UTF-8.
    NotUtf8,
    /// The key normalized to an empty path.
    EmptyKey,
    /// The value could not be fetched.
    FetchFailed(String),
    /// The key disappeared between enumeration and fetch.
    Missing,
    /// The value carries the file marker but cannot be decoded.
    MalformedEnvelope(EnvelopeError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsidePrefix => f.write_str("outside the configured prefix"),
            Self::NotUtf8 => f.write_str("not valid UTF-8"),
            Self::EmptyKey => f.write_str("empty once normalized"),
            Self::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            Self::Missing => f.write_str("no value"),
            Self::MalformedEnvelope(err) => fmt::Display::fmt(err, f),
        }
    }
}

/// A raw store key that produced no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKey {
    /// Key as returned by the store, lossily decoded when not UTF-8.
    pub raw_key: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Summary of a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of scalar entries emitted.
    pub key_values: usize,
    /// Number of file entries emitted.
    pub files: usize,
    /// Keys that produced no entry.
    pub skipped: Vec<SkippedKey>,
}

impl ScanReport {
    /// Returns the number of entries handed to the sink.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.key_values + self.files
    }

    fn skip(&mut self, raw_key: String, reason: SkipReason) {
        self.skipped.push(SkippedKey { raw_key, reason });
    }
}

/// Scans keys under a prefix and routes classified entries to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScanner {
    prefix: String,
    separator: String,
}

impl KeyScanner {
    /// Creates a scanner for a literal prefix and separator.
    #[must_use]
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    /// Creates a scanner using the prefix and separator of `settings`.
    #[must_use]
    pub fn from_settings(settings: &ConnectionSettings) -> Self {
        Self::new(settings.prefix(), settings.separator())
    }

    /// Returns the enumeration pattern sent to the store.
    #[must_use]
    pub fn pattern(&self) -> String {
        scan_pattern(&self.prefix)
    }

    /// Normalizes a raw key and classifies its value without touching a store.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] the scan would record for this key.
    pub fn classify_entry(
        &self,
        raw_key: &str,
        value: String,
    ) -> Result<ClassifiedEntry, SkipReason> {
        let key = self.normalize(raw_key)?;
        Self::entry(key, value)
    }

    fn normalize(&self, raw_key: &str) -> Result<ConfigKey, SkipReason> {
        ConfigKey::normalize(raw_key, &self.prefix, &self.separator).map_err(|rejection| {
            match rejection {
                KeyRejection::OutsidePrefix => SkipReason::OutsidePrefix,
                KeyRejection::Empty => SkipReason::EmptyKey,
            }
        })
    }

    fn entry(key: ConfigKey, value: String) -> Result<ClassifiedEntry, SkipReason> {
        match classify(&value) {
            Classification::Scalar => Ok(ClassifiedEntry::KeyValue { key, value }),
            Classification::File(payload) => Ok(ClassifiedEntry::File { key, payload }),
            Classification::MalformedEnvelope(err) => Err(SkipReason::MalformedEnvelope(err)),
        }
    }

    /// Enumerates every key under the prefix, in store order, and hands each
    /// classified entry to `sink`.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Scan`] when enumeration fails.
    /// - [`LoadError::Sink`] when the sink rejects an entry.
    pub async fn scan<K, S>(&self, store: &mut K, sink: &mut S) -> LoadResult<ScanReport>
    where
        K: KeyValueStore + ?Sized,
        S: ConfigSink + ?Sized,
    {
        let pattern = self.pattern();
        let keys = store
            .keys(&pattern)
            .await
            .map_err(|err| LoadError::scan(err.to_string()))?;
        debug!(%pattern, count = keys.len(), "keys enumerated");

        let mut report = ScanReport::default();
        for raw in keys {
            let raw_key = match String::from_utf8(raw) {
                Ok(raw_key) => raw_key,
                Err(err) => {
                    let raw_key = String::from_utf8_lossy(err.as_bytes()).into_owned();
                    warn!(%raw_key, "skipping key that is not valid UTF-8");
                    report.skip(raw_key, SkipReason::NotUtf8);
                    continue;
                }
            };

            let key = match self.normalize(&raw_key) {
                Ok(key) => key,
                Err(SkipReason::OutsidePrefix) => {
                    debug!(%raw_key, "ignoring key outside prefix");
                    report.skip(raw_key, SkipReason::OutsidePrefix);
                    continue;
                }
                Err(reason) => {
                    warn!(%raw_key, %reason, "skipping key");
                    report.skip(raw_key, reason);
                    continue;
                }
            };

            let value = match store.get(&raw_key).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    warn!(%raw_key, "skipping key without value");
                    report.skip(raw_key, SkipReason::Missing);
                    continue;
                }
                Err(err) => {
                    warn!(%raw_key, ?err, "skipping unreadable key");
                    report.skip(raw_key, SkipReason::FetchFailed(err.to_string()));
                    continue;
                }
            };

            let entry = match Self::entry(key, value) {
                Ok(entry) => entry,
                Err(reason) => {
                    warn!(%raw_key, %reason, "skipping key");
                    report.skip(raw_key, reason);
                    continue;
                }
            };

            let rendered = entry.key().to_string();
            let is_file = entry.is_file();
            sink.accept(entry)
                .map_err(|err| LoadError::sink(rendered, err.to_string()))?;
            if is_file {
                report.files += 1;
            } else {
                report.key_values += 1;
            }
        }

        info!(
            key_values = report.key_values,
            files = report.files,
            skipped = report.skipped.len(),
            "configuration scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{CollectingSink, SinkError, SinkResult};
    use rconf_primitives::FilePayload;
    use rconf_store::{MemoryStore, StoreCall, StoreConnector};

    async fn scan_store(
        store: &MemoryStore,
        scanner: &KeyScanner,
    ) -> (LoadResult<ScanReport>, CollectingSink) {
        let mut connection = store.connect("localhost", 6379).await.unwrap();
        let mut sink = CollectingSink::new();
        let report = scanner.scan(&mut connection, &mut sink).await;
        (report, sink)
    }

    #[tokio::test]
    async fn remaps_separator() {
        let store = MemoryStore::new();
        store.insert("app:a:b", "v");

        let (report, sink) = scan_store(&store, &KeyScanner::new("app", ":")).await;
        assert_eq!(report.unwrap().key_values, 1);
        assert_eq!(sink.value("a.b"), Some("v"));
    }

    #[tokio::test]
    async fn empty_prefix_keeps_dotted_keys() {
        let store = MemoryStore::new();
        store.insert("my.key", "Hello World");

        let (report, sink) = scan_store(&store, &KeyScanner::new("", ".")).await;
        report.unwrap();
        assert_eq!(
            sink.entries(),
            [ClassifiedEntry::KeyValue {
                key: ConfigKey::new("my.key").unwrap(),
                value: "Hello World".into(),
            }]
        );
    }

    #[tokio::test]
    async fn routes_envelopes_to_files() {
        let store = MemoryStore::new();
        store.insert("test.tls.cert", "<FILE>./test;SGVsbG8gV29ybGQh");
        store.insert("test.tls.enabled", "true");

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        let report = report.unwrap();
        assert_eq!((report.key_values, report.files), (1, 1));
        let file = sink.file("tls.cert").unwrap();
        assert_eq!(file.path(), "./test");
        assert_eq!(file.content_str(), Some("Hello World!"));
        assert_eq!(sink.value("tls.enabled"), Some("true"));
    }

    #[tokio::test]
    async fn empty_value_is_an_empty_scalar() {
        let store = MemoryStore::new();
        store.insert("test.blank", "");

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        assert_eq!(report.unwrap().key_values, 1);
        assert_eq!(sink.value("blank"), Some(""));
    }

    #[tokio::test]
    async fn skips_unreadable_and_missing_keys() {
        let store = MemoryStore::new();
        store.insert("test.good", "1");
        store.insert("test.list", "ignored");
        store.insert("test.gone", "ignored");
        store.fail_get(
            "test.list",
            "WRONGTYPE Operation against a key holding the wrong kind of value",
        );
        store.vanish_on_get("test.gone");

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        let report = report.unwrap();
        assert_eq!(report.key_values, 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.value("good"), Some("1"));

        let reasons: Vec<_> = report
            .skipped
            .iter()
            .map(|skipped| (skipped.raw_key.as_str(), &skipped.reason))
            .collect();
        assert_eq!(reasons.len(), 2);
        assert!(reasons.contains(&("test.gone", &SkipReason::Missing)));
        assert!(
            reasons
                .iter()
                .any(|(key, reason)| *key == "test.list"
                    && matches!(reason, SkipReason::FetchFailed(_)))
        );
    }

    #[tokio::test]
    async fn skips_malformed_envelope_and_empty_key() {
        let store = MemoryStore::new();
        store.insert("test.bad", "<FILE>no-delimiter");
        store.insert("test", "orphan");
        store.insert("test.ok", "yes");

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        let report = report.unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.contains(&SkippedKey {
            raw_key: "test".into(),
            reason: SkipReason::EmptyKey,
        }));
        assert!(report.skipped.contains(&SkippedKey {
            raw_key: "test.bad".into(),
            reason: SkipReason::MalformedEnvelope(EnvelopeError::MissingDelimiter),
        }));
        assert!(!store.calls().contains(&StoreCall::Get("test".into())));
    }

    #[tokio::test]
    async fn non_utf8_key_is_skipped_without_losing_its_neighbours() {
        let store = MemoryStore::new();
        store.insert("test.a", "1");
        store.insert_binary_key(b"test.\xff".to_vec());

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        let report = report.unwrap();
        assert_eq!(report.key_values, 1);
        assert_eq!(sink.value("a"), Some("1"));
        assert_eq!(
            report.skipped,
            [SkippedKey {
                raw_key: "test.\u{fffd}".into(),
                reason: SkipReason::NotUtf8,
            }]
        );
        assert_eq!(
            store
                .calls()
                .iter()
                .filter(|call| matches!(call, StoreCall::Get(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn enumeration_failure_is_fatal() {
        let store = MemoryStore::new();
        store.insert("test.a", "1");
        store.fail_enumeration("LOADING Redis is loading the dataset in memory");

        let (report, sink) = scan_store(&store, &KeyScanner::new("test", ".")).await;
        assert!(matches!(report, Err(LoadError::Scan { .. })));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn glob_characters_in_prefix_are_literal() {
        let store = MemoryStore::new();
        store.insert("cfg*.a", "1");
        store.insert("cfgX.b", "2");

        let scanner = KeyScanner::new("cfg*", ".");
        assert_eq!(scanner.pattern(), "cfg\\**");
        let (report, sink) = scan_store(&store, &scanner).await;
        report.unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.value("a"), Some("1"));
    }

    struct RejectingSink;

    impl ConfigSink for RejectingSink {
        fn accept_key_value(&mut self, _key: ConfigKey, _value: String) -> SinkResult<()> {
            Err(SinkError::rejected("read-only"))
        }

        fn accept_file(&mut self, _key: ConfigKey, _payload: FilePayload) -> SinkResult<()> {
            Err(SinkError::rejected("read-only"))
        }
    }

    #[tokio::test]
    async fn sink_failure_aborts() {
        let store = MemoryStore::new();
        store.insert("test.a", "1");

        let mut connection = store.connect("localhost", 6379).await.unwrap();
        let err = KeyScanner::new("test", ".")
            .scan(&mut connection, &mut RejectingSink)
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::sink("a", "read-only"));
    }

    #[test]
    fn classify_entry_is_pure() {
        let scanner = KeyScanner::new("test", ".");
        assert_eq!(
            scanner.classify_entry("test.db.default.timeout", "5000".into()),
            Ok(ClassifiedEntry::KeyValue {
                key: ConfigKey::new("db.default.timeout").unwrap(),
                value: "5000".into(),
            })
        );
        assert_eq!(
            scanner.classify_entry("other.key", "x".into()),
            Err(SkipReason::OutsidePrefix)
        );
    }
}
