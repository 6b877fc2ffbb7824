//! Dotted configuration keys derived from raw store keys.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path separator used by configuration keys.
pub const PATH_SEPARATOR: char = '.';

/// Reasons a raw store key does not yield a configuration key.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum KeyRejection {
    /// The raw key does not start with the configured prefix.
    #[error("key does not start with the configured prefix")]
    OutsidePrefix,
    /// Nothing usable remains once the prefix and stray delimiters are removed.
    #[error("key is empty once normalized")]
    Empty,
}

/// Normalized, dotted configuration path (e.g. `db.default.driver`).
///
/// A `ConfigKey` is never empty and always starts with a character in
/// `[0-9A-Za-z_]`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Derives a configuration key from a raw store key.
    ///
    /// The literal `prefix` is removed from the front, every literal
    /// occurrence of `separator` becomes `.`, then leading characters outside
    /// `[0-9A-Za-z_]` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`KeyRejection::OutsidePrefix`] when `raw` does not start with
    /// `prefix`, and [`KeyRejection::Empty`] when nothing remains.
    pub fn normalize(raw: &str, prefix: &str, separator: &str) -> Result<Self, KeyRejection> {
        let stripped = raw
            .strip_prefix(prefix)
            .ok_or(KeyRejection::OutsidePrefix)?;
        let dotted = if separator.is_empty() {
            stripped.to_owned()
        } else {
            stripped.replace(separator, ".")
        };
        Self::new(trim_leading(&dotted))
    }

    /// Wraps an already-dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`KeyRejection::Empty`] when `path` is empty or starts with a
    /// character outside `[0-9A-Za-z_]`.
    pub fn new(path: impl Into<String>) -> Result<Self, KeyRejection> {
        let path = path.into();
        match path.chars().next() {
            Some(first) if is_leading_char(first) => Ok(Self(path)),
            _ => Err(KeyRejection::Empty),
        }
    }

    /// Returns the dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    /// Consumes the key and returns the owned path.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Returns `true` for characters allowed at the start of a configuration key.
#[must_use]
pub const fn is_leading_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn trim_leading(path: &str) -> &str {
    path.trim_start_matches(|c: char| !is_leading_char(c))
}

/// Escapes glob metacharacters so `literal` matches only itself.
#[must_use]
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the enumeration pattern selecting every key under `prefix`.
#[must_use]
pub fn scan_pattern(prefix: &str) -> String {
    let mut pattern = escape_glob(prefix);
    pattern.push('*');
    pattern
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ConfigKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for ConfigKey {
    type Err = KeyRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConfigKey {
    type Error = KeyRejection;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfigKey> for String {
    fn from(value: ConfigKey) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_prefix_and_maps_separator() {
        let key = ConfigKey::normalize("test:a:b", "test", ":").unwrap();
        assert_eq!(key.as_str(), "a.b");
        assert_eq!(key.segments().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn dot_separator_is_identity() {
        let key = ConfigKey::normalize("my.key", "", ".").unwrap();
        assert_eq!(key.as_str(), "my.key");
    }

    #[test]
    fn drops_stray_leading_delimiter() {
        let key = ConfigKey::normalize("test.db.default.driver", "test", ".").unwrap();
        assert_eq!(key.as_str(), "db.default.driver");

        let key = ConfigKey::normalize("app/-/x", "app/", "/").unwrap();
        assert_eq!(key.as_str(), "x");
    }

    #[test]
    fn drops_repeated_leading_delimiters() {
        let key = ConfigKey::normalize("test..a", "test", ".").unwrap();
        assert_eq!(key.as_str(), "a");
    }

    #[test]
    fn prefix_removed_only_at_front() {
        let key = ConfigKey::normalize("cfg.cfg.x", "cfg", ".").unwrap();
        assert_eq!(key.as_str(), "cfg.x");
    }

    #[test]
    fn multi_char_separator() {
        let key = ConfigKey::normalize("svc::http::port", "svc", "::").unwrap();
        assert_eq!(key.as_str(), "http.port");
    }

    #[test]
    fn rejects_outside_prefix() {
        assert_eq!(
            ConfigKey::normalize("other.key", "test", "."),
            Err(KeyRejection::OutsidePrefix)
        );
    }

    #[test]
    fn rejects_key_equal_to_prefix() {
        assert_eq!(
            ConfigKey::normalize("test", "test", "."),
            Err(KeyRejection::Empty)
        );
        assert_eq!(
            ConfigKey::normalize("test.", "test", "."),
            Err(KeyRejection::Empty)
        );
    }

    #[test]
    fn escapes_glob_metacharacters() {
        assert_eq!(escape_glob("a*b?c[d]e\\f"), "a\\*b\\?c\\[d\\]e\\\\f");
        assert_eq!(scan_pattern("test"), "test*");
        assert_eq!(scan_pattern(""), "*");
    }

    #[test]
    fn deserialize_enforces_invariant() {
        let key: ConfigKey = serde_json::from_str("\"db.default\"").unwrap();
        assert_eq!(key.as_str(), "db.default");
        assert!(serde_json::from_str::<ConfigKey>("\".db\"").is_err());
        assert!(serde_json::from_str::<ConfigKey>("\"\"").is_err());
    }

    proptest! {
        #[test]
        fn normalized_key_starts_with_word_char(
            prefix in "[a-z:._-]{0,6}",
            suffix in "\\PC{0,24}",
            separator in "[.:/_-]{1,2}",
        ) {
            let raw = format!("{prefix}{suffix}");
            if let Ok(key) = ConfigKey::normalize(&raw, &prefix, &separator) {
                let first = key.as_str().chars().next().unwrap();
                prop_assert!(is_leading_char(first));
            }
        }

        #[test]
        fn keys_under_prefix_never_outside(
            prefix in "[a-z.]{0,6}",
            suffix in "[a-zA-Z0-9._]{0,16}",
        ) {
            let raw = format!("{prefix}{suffix}");
            prop_assert_ne!(
                ConfigKey::normalize(&raw, &prefix, "."),
                Err(KeyRejection::OutsidePrefix)
            );
        }
    }
}
