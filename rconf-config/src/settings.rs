//! Validated connection settings.

use std::fmt;

use rconf_primitives::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Separator used when the input does not provide one.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Integer setting that may arrive as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntSetting {
    /// Native integer.
    Int(i64),
    /// Textual integer, parsed during resolution.
    Text(String),
}

impl IntSetting {
    fn resolve(&self, field: &'static str) -> LoadResult<i64> {
        match self {
            Self::Int(value) => Ok(*value),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| LoadError::validation(field, format!("`{text}` is not an integer"))),
        }
    }
}

impl From<i64> for IntSetting {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Unvalidated settings as read from a configuration object.
///
/// Every field is optional so that missing values are reported by
/// [`RawSettings::resolve`] with the offending field name rather than by the
/// deserializer. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    /// Store host name or address.
    pub host: Option<String>,
    /// Store TCP port.
    pub port: Option<IntSetting>,
    /// Logical database index.
    pub db: Option<IntSetting>,
    /// Optional password; empty means no authentication.
    pub password: Option<String>,
    /// Literal key prefix.
    pub prefix: Option<String>,
    /// Literal path separator inside store keys.
    pub separator: Option<String>,
}

impl RawSettings {
    /// Reads settings from a configuration object, field by field.
    ///
    /// Absent and `null` fields are left unset.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Validation`] for field `settings` when `value` is
    /// not an object, and for the offending field when it has the wrong shape
    /// (e.g. `host` is a number or `port` is fractional).
    pub fn from_value(value: &Value) -> LoadResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(LoadError::validation(
                "settings",
                "expected a configuration object",
            ));
        };
        Ok(Self {
            host: text_field(object, "host")?,
            port: int_field(object, "port")?,
            db: int_field(object, "db")?,
            password: text_field(object, "password")?,
            prefix: text_field(object, "prefix")?,
            separator: text_field(object, "separator")?,
        })
    }

    /// Validates the settings and applies defaults.
    ///
    /// Fields are checked in order `host`, `port`, `db`, `separator`; the first
    /// violation is reported.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Validation`] naming the offending field.
    pub fn resolve(self) -> LoadResult<ConnectionSettings> {
        let host = match self.host {
            Some(host) if !host.trim().is_empty() => host,
            _ => return Err(LoadError::validation("host", "required")),
        };

        let port = self
            .port
            .ok_or_else(|| LoadError::validation("port", "required"))?
            .resolve("port")?;
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| LoadError::validation("port", format!("invalid port number {port}")))?;

        let db = match self.db {
            Some(db) => db.resolve("db")?,
            None => 0,
        };
        let db = u32::try_from(db).map_err(|_| {
            LoadError::validation("db", format!("must be greater or equal to 0, got {db}"))
        })?;

        let separator = self
            .separator
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_owned());
        if separator.is_empty() {
            return Err(LoadError::validation("separator", "required"));
        }

        let password = self.password.filter(|password| !password.is_empty());
        let prefix = self.prefix.unwrap_or_default();

        debug!(%host, port, db, %prefix, %separator, "resolved connection settings");

        Ok(ConnectionSettings {
            host,
            port,
            db,
            password,
            prefix,
            separator,
        })
    }
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

fn text_field(object: &Map<String, Value>, field: &'static str) -> LoadResult<Option<String>> {
    present(object, field)
        .map(|value| {
            String::deserialize(value).map_err(|err| LoadError::validation(field, err.to_string()))
        })
        .transpose()
}

fn int_field(object: &Map<String, Value>, field: &'static str) -> LoadResult<Option<IntSetting>> {
    let Some(value) = present(object, field) else {
        return Ok(None);
    };
    let setting = match value {
        Value::Number(number) => number.as_i64().map(IntSetting::Int).ok_or_else(|| {
            LoadError::validation(field, format!("expected an integer, got {number}"))
        }),
        Value::String(text) => Ok(IntSetting::Text(text.clone())),
        other => Err(LoadError::validation(
            field,
            format!("expected an integer or a numeric string, got {other}"),
        )),
    };
    setting.map(Some)
}

impl TryFrom<RawSettings> for ConnectionSettings {
    type Error = LoadError;

    fn try_from(value: RawSettings) -> Result<Self, Self::Error> {
        value.resolve()
    }
}

/// Settings accepted by the store connector.
///
/// Construction goes through [`RawSettings::resolve`] or
/// [`ConnectionSettings::builder`], so every instance satisfies the range and
/// non-emptiness rules.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    host: String,
    port: u16,
    db: u32,
    password: Option<String>,
    prefix: String,
    separator: String,
}

impl ConnectionSettings {
    /// Starts building settings for the given endpoint.
    #[must_use]
    pub fn builder(host: impl Into<String>, port: i64) -> ConnectionSettingsBuilder {
        ConnectionSettingsBuilder {
            raw: RawSettings {
                host: Some(host.into()),
                port: Some(IntSetting::Int(port)),
                ..RawSettings::default()
            },
        }
    }

    /// Returns the store host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the store port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the logical database index; `0` is the default database.
    #[must_use]
    pub const fn db_index(&self) -> u32 {
        self.db
    }

    /// Returns the password when authentication is required.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns the literal key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the literal path separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("separator", &self.separator)
            .finish()
    }
}

/// Builder for [`ConnectionSettings`].
#[derive(Debug, Clone)]
pub struct ConnectionSettingsBuilder {
    raw: RawSettings,
}

impl ConnectionSettingsBuilder {
    /// Sets the logical database index.
    #[must_use]
    pub fn db(mut self, db: i64) -> Self {
        self.raw.db = Some(IntSetting::Int(db));
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.raw.password = Some(password.into());
        self
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.raw.prefix = Some(prefix.into());
        self
    }

    /// Sets the key separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.raw.separator = Some(separator.into());
        self
    }

    /// Validates and returns the settings.
    ///
    /// # Errors
    ///
    /// Same as [`RawSettings::resolve`].
    pub fn build(self) -> LoadResult<ConnectionSettings> {
        self.raw.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(value: Value) -> Option<&'static str> {
        RawSettings::from_value(&value)
            .and_then(RawSettings::resolve)
            .unwrap_err()
            .field()
    }

    #[test]
    fn applies_defaults() {
        let settings = RawSettings::from_value(&json!({"host": "localhost", "port": 6379}))
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(settings.host(), "localhost");
        assert_eq!(settings.port(), 6379);
        assert_eq!(settings.db_index(), 0);
        assert_eq!(settings.password(), None);
        assert_eq!(settings.prefix(), "");
        assert_eq!(settings.separator(), ".");
    }

    #[test]
    fn reads_every_field() {
        let settings = RawSettings::from_value(&json!({
            "host": "terra.example.com",
            "port": "6380",
            "db": 2,
            "password": "s3cret",
            "prefix": "test",
            "separator": ":",
            "unrelated": true,
        }))
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(settings.port(), 6380);
        assert_eq!(settings.db_index(), 2);
        assert_eq!(settings.password(), Some("s3cret"));
        assert_eq!(settings.prefix(), "test");
        assert_eq!(settings.separator(), ":");
    }

    #[test]
    fn empty_password_means_no_auth() {
        let settings = ConnectionSettings::builder("localhost", 6379)
            .password("")
            .build()
            .unwrap();
        assert_eq!(settings.password(), None);
    }

    #[test]
    fn rejects_missing_or_blank_host() {
        assert_eq!(field_of(json!({"port": 6379})), Some("host"));
        assert_eq!(field_of(json!({"host": "", "port": 6379})), Some("host"));
        assert_eq!(field_of(json!({"host": "  ", "port": 6379})), Some("host"));
    }

    #[test]
    fn rejects_bad_ports() {
        assert_eq!(field_of(json!({"host": "h"})), Some("port"));
        assert_eq!(field_of(json!({"host": "h", "port": 0})), Some("port"));
        assert_eq!(field_of(json!({"host": "h", "port": -1})), Some("port"));
        assert_eq!(field_of(json!({"host": "h", "port": 70000})), Some("port"));
        assert_eq!(field_of(json!({"host": "h", "port": "http"})), Some("port"));
        let max = RawSettings::from_value(&json!({"host": "h", "port": 65535}))
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(max.port(), 65535);
    }

    #[test]
    fn rejects_negative_db() {
        assert_eq!(field_of(json!({"host": "h", "port": 1, "db": -1})), Some("db"));
    }

    #[test]
    fn rejects_empty_separator() {
        assert_eq!(
            field_of(json!({"host": "h", "port": 1, "separator": ""})),
            Some("separator")
        );
    }

    #[test]
    fn reports_first_violation() {
        assert_eq!(
            field_of(json!({"host": "", "port": 0, "db": -1, "separator": ""})),
            Some("host")
        );
        assert_eq!(
            field_of(json!({"host": "h", "port": 1, "db": -1, "separator": ""})),
            Some("db")
        );
    }

    #[test]
    fn rejects_non_object_input() {
        assert_eq!(field_of(json!("redis://localhost")), Some("settings"));
        assert_eq!(field_of(json!(["localhost", 6379])), Some("settings"));
    }

    #[test]
    fn names_the_misshaped_field() {
        let cases = [
            (json!({"host": 12, "port": 1}), "host"),
            (json!({"host": "h", "port": 6379.5}), "port"),
            (json!({"host": "h", "port": 1, "db": true}), "db"),
            (json!({"host": "h", "port": 1, "password": 42}), "password"),
            (json!({"host": "h", "port": 1, "prefix": ["a"]}), "prefix"),
            (json!({"host": "h", "port": 1, "separator": {}}), "separator"),
        ];
        for (input, field) in cases {
            let err = RawSettings::from_value(&input).unwrap_err();
            assert_eq!(err.field(), Some(field), "{input}");
            assert!(err.to_string().contains(&format!("`{field}`")), "{err}");
        }
    }

    #[test]
    fn null_fields_are_unset() {
        let raw = RawSettings::from_value(&json!({
            "host": "h",
            "port": 1,
            "db": null,
            "password": null,
        }))
        .unwrap();
        assert_eq!(raw.db, None);
        assert_eq!(raw.password, None);
        assert_eq!(raw.resolve().unwrap().db_index(), 0);
    }

    #[test]
    fn debug_redacts_password() {
        let settings = ConnectionSettings::builder("localhost", 6379)
            .password("hunter2")
            .build()
            .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
