//! File envelope detection and decoding.
//!
//! A stored value is a file payload when it starts with [`FILE_MARKER`],
//! followed by the target path, a `;`, and the standard padded base64 encoding
//! of the file content:
//!
//! ```text
//! <FILE>./test;SGVsbG8gV29ybGQh
//! ```
//!
//! Anything else is a plain scalar value.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use thiserror::Error;

/// Marker opening a file envelope.
pub const FILE_MARKER: &str = "<FILE>";

/// Delimiter between the target path and the encoded payload.
pub const PATH_DELIMITER: char = ';';

/// Decoded file carried by an envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePayload {
    path: String,
    content: Bytes,
}

impl FilePayload {
    /// Creates a payload for the given target path.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Returns the target path declared by the envelope.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the decoded content.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns the content as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Encodes the payload back into its envelope form.
    #[must_use]
    pub fn to_envelope(&self) -> String {
        format!(
            "{FILE_MARKER}{}{PATH_DELIMITER}{}",
            self.path,
            STANDARD.encode(&self.content)
        )
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("path", &self.path)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Reasons a marked value could not be decoded as a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No `;` between the path and the payload.
    #[error("file envelope is missing the `;` path delimiter")]
    MissingDelimiter,
    /// The declared path is empty.
    #[error("file envelope declares an empty path")]
    EmptyPath,
    /// The payload is not valid base64.
    #[error("file envelope payload is not valid base64: {reason}")]
    InvalidPayload {
        /// Decoder message.
        reason: String,
    },
}

/// Outcome of inspecting a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Plain configuration value.
    Scalar,
    /// Well-formed file envelope.
    File(FilePayload),
    /// Value carries the file marker but cannot be decoded.
    MalformedEnvelope(EnvelopeError),
}

impl Classification {
    /// Returns `true` when the value carries the file marker.
    #[must_use]
    pub const fn is_file_marked(&self) -> bool {
        !matches!(self, Self::Scalar)
    }
}

/// Returns `true` when `value` opens with the file marker.
#[must_use]
pub fn is_file(value: &str) -> bool {
    value.starts_with(FILE_MARKER)
}

/// Classifies a stored value. Pure and total over all strings.
#[must_use]
pub fn classify(value: &str) -> Classification {
    let Some(body) = value.strip_prefix(FILE_MARKER) else {
        return Classification::Scalar;
    };
    match decode(body) {
        Ok(payload) => Classification::File(payload),
        Err(err) => Classification::MalformedEnvelope(err),
    }
}

fn decode(body: &str) -> Result<FilePayload, EnvelopeError> {
    let (path, encoded) = body
        .split_once(PATH_DELIMITER)
        .ok_or(EnvelopeError::MissingDelimiter)?;
    let path = path.trim();
    if path.is_empty() {
        return Err(EnvelopeError::EmptyPath);
    }
    let content = STANDARD
        .decode(encoded.trim_ascii())
        .map_err(|err| EnvelopeError::InvalidPayload {
            reason: err.to_string(),
        })?;
    Ok(FilePayload::new(path, content))
}
