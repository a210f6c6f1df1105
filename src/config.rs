//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Where the document store lives.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    /// Local libSQL file.
    Local(PathBuf),
    /// Remote libSQL server (e.g. Turso) with its auth token.
    Remote { url: String, token: SecretString },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port for the API server.
    pub port: u16,
    /// Document store location.
    pub store: StoreLocation,
    /// Size of the "most recent businesses" slice in the enterprise view.
    pub recent_limit: usize,
    /// Directory for rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            store: StoreLocation::Local(PathBuf::from("./data/nceda-hub.db")),
            recent_limit: 5,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from `NCEDA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("NCEDA_PORT") {
            Some(raw) => parse_value("NCEDA_PORT", &raw)?,
            None => defaults.port,
        };

        let recent_limit = match lookup("NCEDA_RECENT_LIMIT") {
            Some(raw) => parse_value("NCEDA_RECENT_LIMIT", &raw)?,
            None => defaults.recent_limit,
        };

        let store = match lookup("NCEDA_DB_URL") {
            Some(url) => {
                let token = lookup("NCEDA_DB_TOKEN").ok_or_else(|| ConfigError::MissingRequired {
                    key: "NCEDA_DB_TOKEN".to_string(),
                    hint: "A remote database URL needs an auth token.".to_string(),
                })?;
                StoreLocation::Remote {
                    url,
                    token: SecretString::from(token),
                }
            }
            None => lookup("NCEDA_DB_PATH")
                .map(|p| StoreLocation::Local(PathBuf::from(p)))
                .unwrap_or(defaults.store),
        };

        Ok(Self {
            port,
            store,
            recent_limit,
            log_dir: lookup("NCEDA_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.recent_limit, 5);
        assert!(config.log_dir.is_none());
        match config.store {
            StoreLocation::Local(path) => assert_eq!(path, PathBuf::from("./data/nceda-hub.db")),
            other => panic!("expected local store, got {other:?}"),
        }
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("NCEDA_PORT", "9090"),
            ("NCEDA_RECENT_LIMIT", "12"),
            ("NCEDA_DB_PATH", "/tmp/hub.db"),
            ("NCEDA_LOG_DIR", "/var/log/hub"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.recent_limit, 12);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/hub")));
        assert!(matches!(config.store, StoreLocation::Local(ref p) if p == &PathBuf::from("/tmp/hub.db")));
    }

    #[test]
    fn remote_store_requires_token() {
        let err = AppConfig::from_lookup(lookup_from(&[("NCEDA_DB_URL", "libsql://hub.turso.io")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "NCEDA_DB_TOKEN"));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("NCEDA_DB_URL", "libsql://hub.turso.io"),
            ("NCEDA_DB_TOKEN", "secret"),
        ]))
        .unwrap();
        match config.store {
            StoreLocation::Remote { url, token } => {
                assert_eq!(url, "libsql://hub.turso.io");
                assert_eq!(token.expose_secret(), "secret");
            }
            other => panic!("expected remote store, got {other:?}"),
        }
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("NCEDA_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "NCEDA_PORT"));
    }
}
