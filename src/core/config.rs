//! `curator.toml` loading.
//!
//! Resolution order for the database path: `--db` flag, then `CURATOR_DB`,
//! then `[store].path` from the config file, then the built-in default.

use crate::catalog::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};
use crate::core::error::CuratorError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "curator.toml";
pub const DB_ENV_VAR: &str = "CURATOR_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    pub store: StoreConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(schemas::CATALOG_DB_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

pub fn parse_config(content: &str) -> Result<CuratorConfig, CuratorError> {
    toml::from_str(content).map_err(|e| CuratorError::ConfigError(e.to_string()))
}

/// Load config from `path`, or from `./curator.toml` when no path is given.
/// An explicit path must exist; the implicit one may be absent (defaults).
pub fn load_config(path: Option<&Path>) -> Result<CuratorConfig, CuratorError> {
    let mut config = match path {
        Some(explicit) => {
            let content = fs::read_to_string(explicit).map_err(CuratorError::IoError)?;
            parse_config(&content)?
        }
        None => {
            let implicit = Path::new(CONFIG_FILE_NAME);
            if implicit.exists() {
                let content = fs::read_to_string(implicit).map_err(CuratorError::IoError)?;
                parse_config(&content)?
            } else {
                CuratorConfig::default()
            }
        }
    };

    let from_env = match env::var(DB_ENV_VAR) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(e) => return Err(CuratorError::EnvVarError(e)),
    };
    apply_db_override(&mut config, from_env.as_deref());
    Ok(config)
}

/// Replace the store path with a non-empty override.
pub fn apply_db_override(config: &mut CuratorConfig, value: Option<&str>) {
    if let Some(path) = value.map(str::trim).filter(|p| !p.is_empty()) {
        config.store.path = PathBuf::from(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retry_contract() {
        let config = CuratorConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.store.path, PathBuf::from("curator.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = parse_config("[retry]\nbase_delay_ms = 250\n").unwrap();
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.policy().base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = parse_config("[retry]\nmax_retries = \"many\"\n").unwrap_err();
        assert!(matches!(err, CuratorError::ConfigError(_)));
    }

    #[test]
    fn test_db_override_ignores_blank_values() {
        let mut config = parse_config("[store]\npath = \"/var/lib/curator.db\"\n").unwrap();
        apply_db_override(&mut config, Some("   "));
        assert_eq!(config.store.path, PathBuf::from("/var/lib/curator.db"));
        apply_db_override(&mut config, Some("/tmp/other.db"));
        assert_eq!(config.store.path, PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_explicit_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(Some(&tmp.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, CuratorError::IoError(_)));
    }
}
