//! Writes file entries to disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use rconf_primitives::{ConfigKey, FilePayload};
use tracing::info;

use crate::sink::{ConfigSink, SinkError, SinkResult};

/// Sink that writes each file payload below a root directory, then forwards
/// every entry to an inner sink.
///
/// Envelope paths must be relative and may not contain `..`; anything else is
/// rejected so a stored value cannot write outside the root.
///
/// Sinks are synchronous, so writes use blocking `std::fs` calls and block
/// the task driving the scan while a file is written.
#[derive(Debug)]
pub struct FileMaterializer<S> {
    root: PathBuf,
    inner: S,
    written: Vec<PathBuf>,
}

impl<S: ConfigSink> FileMaterializer<S> {
    /// Creates a materializer writing below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, inner: S) -> Self {
        Self {
            root: root.into(),
            inner,
            written: Vec::new(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the paths written so far.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Returns the inner sink.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Consumes the materializer and returns the inner sink.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn resolve(&self, declared: &str) -> SinkResult<PathBuf> {
        let relative = Path::new(declared);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(SinkError::rejected(format!(
                "file path `{declared}` escapes the output directory"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl<S: ConfigSink> ConfigSink for FileMaterializer<S> {
    fn accept_key_value(&mut self, key: ConfigKey, value: String) -> SinkResult<()> {
        self.inner.accept_key_value(key, value)
    }

    fn accept_file(&mut self, key: ConfigKey, payload: FilePayload) -> SinkResult<()> {
        let target = self.resolve(payload.path())?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, payload.content())?;
        info!(%key, path = %target.display(), bytes = payload.content().len(), "file written");
        self.written.push(target);
        self.inner.accept_file(key, payload)
    }
}
