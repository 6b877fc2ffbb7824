//! Destinations for classified entries.

use rconf_primitives::{ClassifiedEntry, ConfigKey, FilePayload};
use thiserror::Error;

/// Result alias for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Failure reported by a sink. Aborts the scan.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink refused the entry.
    #[error("{reason}")]
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
    /// I/O failure while persisting the entry.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
}

impl SinkError {
    /// Convenience constructor for rejections.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Receives the entries produced by a scan.
///
/// Both methods are called synchronously from the scan loop, at most once per
/// scanned key. Implementations own any synchronization and any timeout.
pub trait ConfigSink {
    /// Records a scalar configuration entry.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the scan.
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()>;

    /// Records a file-backed configuration entry.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the scan.
    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()>;

    /// Routes a classified entry to the matching method.
    ///
    /// # Errors
    ///
    /// Propagates the error of the method it routes to.
    fn accept(&mut self, entry: ClassifiedEntry) -> SinkResult<()> {
        match entry {
            ClassifiedEntry::KeyValue { key, value } => self.accept_key_value(key, value),
            ClassifiedEntry::File { key, payload } => self.accept_file(key, payload),
        }
    }
}

impl<S: ConfigSink + ?Sized> ConfigSink for &mut S {
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()> {
        (**self).accept_key_value(key, value)
    }

    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()> {
        (**self).accept_file(key, payload)
    }
}

impl<S: ConfigSink + ?Sized> ConfigSink for Box<S> {
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()> {
        (**self).accept_key_value(key, value)
    }

    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()> {
        (**self).accept_file(key, payload)
    }
}

/// Sink built from two callbacks, one per entry kind.
pub struct FnSink<KV, F> {
    on_key_value: KV,
    on_file: F,
}

/// Wraps two callbacks into a [`ConfigSink`].
pub fn fn_sink<KV, F>(on_key_value: KV, on_file: F) -> FnSink<KV, F>
where
    KV: FnMut(ConfigKey, String),
    F: FnMut(ConfigKey, FilePayload),
{
    FnSink {
        on_key_value,
        on_file,
    }
}

impl<KV, F> ConfigSink for FnSink<KV, F>
where
    KV: FnMut(ConfigKey, String),
    F: FnMut(ConfigKey, FilePayload),
{
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()> {
        (self.on_key_value)(key, value);
        Ok(())
    }

    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()> {
        (self.on_file)(key, payload);
        Ok(())
    }
}

/// Sink retaining every entry in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    entries: Vec<ClassifiedEntry>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[ClassifiedEntry] {
        &self.entries
    }

    /// Consumes the sink and returns the collected entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<ClassifiedEntry> {
        self.entries
    }

    /// Returns the number of collected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the last scalar value recorded under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.iter().rev().find_map(|entry| match entry {
            ClassifiedEntry::KeyValue { key: k, value } if k.as_str() == key => {
                Some(value.as_str())
            }
            _ => None,
        })
    }

    /// Returns the last file recorded under `key`.
    #[must_use]
    pub fn file(&self, key: &str) -> Option<&FilePayload> {
        self.entries.iter().rev().find_map(|entry| match entry {
            ClassifiedEntry::File { key: k, payload } if k.as_str() == key => Some(payload),
            _ => None,
        })
    }

    /// Iterates over scalar entries.
    pub fn key_values(&self) -> impl Iterator<Item = (&ConfigKey, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            ClassifiedEntry::KeyValue { key, value } => Some((key, value.as_str())),
            ClassifiedEntry::File { .. } => None,
        })
    }

    /// Iterates over file entries.
    pub fn files(&self) -> impl Iterator<Item = (&ConfigKey, &FilePayload)> {
        self.entries.iter().filter_map(|entry| match entry {
            ClassifiedEntry::File { key, payload } => Some((key, payload)),
            ClassifiedEntry::KeyValue { .. } => None,
        })
    }
}

impl ConfigSink for CollectingSink {
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()> {
        self.entries.push(ClassifiedEntry::KeyValue { key, value });
        Ok(())
    }

    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()> {
        self.entries.push(ClassifiedEntry::File { key, payload });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> ConfigKey {
        ConfigKey::new(path).unwrap()
    }

    #[test]
    fn collecting_sink_keeps_order_and_last_value_wins() {
        let mut sink = CollectingSink::new();
        sink.accept_key_value(key("a"), "1".into()).unwrap();
        sink.accept_file(key("f"), FilePayload::new("./f", "data")).unwrap();
        sink.accept_key_value(key("a"), "2".into()).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.value("a"), Some("2"));
        assert_eq!(sink.value("f"), None);
        assert_eq!(sink.file("f").map(FilePayload::path), Some("./f"));
        assert_eq!(sink.key_values().count(), 2);
        assert_eq!(sink.files().count(), 1);
    }

    #[test]
    fn accept_routes_by_kind() {
        let mut values = Vec::new();
        let mut files = Vec::new();
        {
            let mut sink = fn_sink(
                |k: ConfigKey, v: String| values.push((k.into_string(), v)),
                |k: ConfigKey, p: FilePayload| files.push((k.into_string(), p)),
            );
            sink.accept(ClassifiedEntry::KeyValue {
                key: key("x"),
                value: "1".into(),
            })
            .unwrap();
            sink.accept(ClassifiedEntry::File {
                key: key("y"),
                payload: FilePayload::new("./y", "z"),
            })
            .unwrap();
        }
        assert_eq!(values, [("x".to_owned(), "1".to_owned())]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "y");
    }

    #[test]
    fn forwards_through_references_and_boxes() {
        fn feed<S: ConfigSink>(mut sink: S, path: &str) {
            sink.accept_key_value(key(path), "1".into()).unwrap();
        }

        let mut inner = CollectingSink::new();
        feed(&mut inner, "by_ref");
        let boxed: Box<dyn ConfigSink> = Box::new(CollectingSink::new());
        feed(boxed, "boxed");

        assert_eq!(inner.value("by_ref"), Some("1"));
    }
}
