//! # Application Configuration
//!
//! Settings read from the environment, with defaults for local use.
//!
//! | Variable                    | Default                                       |
//! |-----------------------------|-----------------------------------------------|
//! | `SHELF_DB_PATH`             | `shelf.db`                                    |
//! | `SHELF_DB_MAX_CONNECTIONS`  | `5`                                           |
//! | `SHELF_EXPIRY_WARNING_DAYS` | `60`                                          |
//! | `SHELF_LOG`                 | `info,shelf_core=debug,shelf_db=debug,sqlx=warn` |
//!
//! `RUST_LOG`, when set, still wins over `SHELF_LOG`.

use std::path::PathBuf;
use std::str::FromStr;

use shelf_core::EXPIRY_WARNING_DAYS;
use thiserror::Error;

use crate::pool::DbConfig;

const DEFAULT_DB_PATH: &str = "shelf.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_FILTER: &str = "info,shelf_core=debug,shelf_db=debug,sqlx=warn";

/// An environment variable held a value that could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// Window used for "expiring soon".
    pub expiry_warning_days: i64,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            expiry_warning_days: EXPIRY_WARNING_DAYS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, so tests never touch the real
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("SHELF_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = get("SHELF_DB_MAX_CONNECTIONS") {
            let max: u32 = parse("SHELF_DB_MAX_CONNECTIONS", &raw)?;
            if max == 0 {
                return Err(invalid("SHELF_DB_MAX_CONNECTIONS", &raw, "must be at least 1"));
            }
            config.max_connections = max;
        }

        if let Some(raw) = get("SHELF_EXPIRY_WARNING_DAYS") {
            let days: i64 = parse("SHELF_EXPIRY_WARNING_DAYS", &raw)?;
            if days < 0 {
                return Err(invalid("SHELF_EXPIRY_WARNING_DAYS", &raw, "must not be negative"));
            }
            config.expiry_warning_days = days;
        }

        if let Some(filter) = get("SHELF_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Pool settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, raw, &e.to_string()))
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.expiry_warning_days, 60);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SHELF_DB_PATH", "/var/lib/shelf/store.db"),
            ("SHELF_DB_MAX_CONNECTIONS", "8"),
            ("SHELF_EXPIRY_WARNING_DAYS", "30"),
            ("SHELF_LOG", "warn"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/shelf/store.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.expiry_warning_days, 30);
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.db_config().max_connections, 8);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("SHELF_DB_MAX_CONNECTIONS", "many")]));
        assert!(matches!(err, Err(ConfigError::Invalid { ref key, .. }) if key == "SHELF_DB_MAX_CONNECTIONS"));

        let err = AppConfig::from_lookup(lookup(&[("SHELF_DB_MAX_CONNECTIONS", "0")]));
        assert!(err.is_err());

        let err = AppConfig::from_lookup(lookup(&[("SHELF_EXPIRY_WARNING_DAYS", "-1")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("SHELF_DB_PATH", "  ")])).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
    }
}
