// Request defaults loaded from TOML and the environment

use crate::{Error, HttpMethod, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::Path;

/// Environment variable prefix for request defaults
pub const ENV_PREFIX: &str = "TESTHOST_";

/// Request-line defaults for new request doubles.
///
/// ```
/// use testhost_core::{HttpMethod, RequestConfig};
///
/// let config = RequestConfig::from_toml_str(r#"
///     method = "POST"
///     scheme = "https"
/// "#).unwrap();
///
/// assert_eq!(config.method, HttpMethod::POST);
/// assert_eq!(config.uri, "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub method: HttpMethod,
    pub uri: String,
    pub version: String,
    pub scheme: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: HttpMethod::GET,
            uri: "/".to_string(),
            version: "HTTP/1.1".to_string(),
            scheme: "http".to_string(),
        }
    }
}

impl RequestConfig {
    /// Parse configuration from a TOML string. Missing keys keep their
    /// defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("TOML parse error: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `TESTHOST_*` process environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env_os(std::env::vars_os())
    }

    /// Layer `TESTHOST_*` variables over this config from a raw
    /// environment.
    ///
    /// Variables that are not valid UTF-8 are skipped unless they carry the
    /// prefix, in which case they are a configuration error.
    pub fn apply_env_os<I>(self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut utf8 = Vec::new();
        for (key, value) in vars {
            let key = match key.into_string() {
                Ok(key) => key,
                Err(key) if key.to_string_lossy().starts_with(ENV_PREFIX) => {
                    return Err(Error::Config(format!(
                        "Environment variable name is not valid UTF-8: {}",
                        key.to_string_lossy()
                    )));
                }
                Err(_) => continue,
            };
            if !key.starts_with(ENV_PREFIX) {
                continue;
            }

            let value = value.into_string().map_err(|_| {
                Error::Config(format!("Environment variable {} is not valid UTF-8", key))
            })?;
            utf8.push((key, value));
        }

        self.apply_env(utf8)
    }

    /// Layer `TESTHOST_*` variables from `vars` over this config.
    ///
    /// Unrelated and unknown variables are ignored.
    pub fn apply_env<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match field.to_ascii_uppercase().as_str() {
                "METHOD" => {
                    let value = value.into();
                    self.method = HttpMethod::from_str(&value).ok_or_else(|| {
                        Error::Config(format!("Unknown HTTP method: {}", value))
                    })?;
                }
                "URI" => self.uri = value.into(),
                "VERSION" => self.version = value.into(),
                "SCHEME" => self.scheme = value.into(),
                _ => {}
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.method, HttpMethod::GET);
        assert_eq!(config.uri, "/");
        assert_eq!(config.version, "HTTP/1.1");
        assert_eq!(config.scheme, "http");
    }

    #[test]
    fn test_toml_partial() {
        let config = RequestConfig::from_toml_str(
            r#"
            uri = "/api/v1"
            version = "HTTP/2"
        "#,
        )
        .unwrap();

        assert_eq!(config.method, HttpMethod::GET);
        assert_eq!(config.uri, "/api/v1");
        assert_eq!(config.version, "HTTP/2");
    }

    #[test]
    fn test_toml_invalid() {
        assert!(matches!(
            RequestConfig::from_toml_str("method = \"FETCH\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            RequestConfig::from_toml_str("uri = "),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let err = RequestConfig::from_file("/nonexistent/testhost.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("testhost-{}.toml", std::process::id()));
        fs::write(&path, "scheme = \"https\"\n").unwrap();

        let config = RequestConfig::from_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.scheme, "https");
    }

    #[test]
    fn test_apply_env() {
        let vars = vec![
            ("TESTHOST_METHOD", "patch"),
            ("TESTHOST_URI", "/items"),
            ("TESTHOST_SCHEME", "https"),
            ("PATH", "/usr/bin"),
            ("TESTHOST_UNKNOWN", "x"),
        ];

        let config = RequestConfig::default().apply_env(vars).unwrap();
        assert_eq!(config.method, HttpMethod::PATCH);
        assert_eq!(config.uri, "/items");
        assert_eq!(config.scheme, "https");
        assert_eq!(config.version, "HTTP/1.1");
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_env_os_skips_unrelated_non_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("OTHER_BAD"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![b'X', 0xff]), OsString::from("1")),
            (OsString::from("TESTHOST_URI"), OsString::from("/ok")),
        ];

        let config = RequestConfig::default().apply_env_os(vars).unwrap();
        assert_eq!(config.uri, "/ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_env_os_rejects_prefixed_non_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let value = vec![(
            OsString::from("TESTHOST_SCHEME"),
            OsString::from_vec(vec![0xff]),
        )];
        assert!(matches!(
            RequestConfig::default().apply_env_os(value),
            Err(Error::Config(_))
        ));

        let mut name = b"TESTHOST_".to_vec();
        name.push(0xff);
        let key = vec![(OsString::from_vec(name), OsString::from("x"))];
        assert!(matches!(
            RequestConfig::default().apply_env_os(key),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_apply_env_bad_method() {
        let result = RequestConfig::default().apply_env([("TESTHOST_METHOD", "FETCH")]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_serialize_round_trip_through_toml() {
        let config = RequestConfig {
            method: HttpMethod::OPTIONS,
            ..RequestConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("method = \"OPTIONS\""));
        assert_eq!(RequestConfig::from_toml_str(&text).unwrap(), config);
    }
}
