//! Process configuration resolved from `OCTOPUS_*` environment variables.
//!
//! # Invariants
//! - A missing remote URL is not an error: the process runs offline.
//! - Out-of-range timeouts fall back to defaults; malformed log settings are
//!   reported as `ConfigError`.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::remote::{non_blank, RemoteBackend, RemoteConfig};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_FILE_NAME: &str = "octopus_cache.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "OCTOPUS_LOG_LEVEL: {message}"),
            Self::InvalidLogDir(message) => write!(f, "OCTOPUS_LOG_DIR: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub remote: Option<RemoteConfig>,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = non_blank(lookup("OCTOPUS_DB_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(DB_FILE_NAME));

        let log_level = match non_blank(lookup("OCTOPUS_LOG_LEVEL")) {
            Some(level) => normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };
        let log_dir = non_blank(lookup("OCTOPUS_LOG_DIR"))
            .map(|dir| normalize_log_dir(&dir).map_err(ConfigError::InvalidLogDir))
            .transpose()?;

        Ok(Self {
            db_path,
            remote: RemoteConfig::from_lookup(&lookup),
            log_level,
            log_dir,
        })
    }

    /// Builds the remote backend; `Offline` without a configured URL.
    pub fn remote_backend(&self) -> RemoteBackend {
        RemoteBackend::from_config(self.remote.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DB_FILE_NAME};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults_and_offline_backend() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.db_path.ends_with(DB_FILE_NAME));
        assert!(config.remote.is_none());
        assert!(config.remote_backend().is_offline());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn explicit_values_are_applied() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("OCTOPUS_DB_PATH", "/var/lib/octopus/cache.sqlite3"),
            ("OCTOPUS_REMOTE_URL", "https://db.example.com/"),
            ("OCTOPUS_LOG_LEVEL", "WARN"),
        ]))
        .unwrap();
        assert_eq!(
            config.db_path.to_str(),
            Some("/var/lib/octopus/cache.sqlite3")
        );
        assert_eq!(
            config.remote.map(|remote| remote.base_url),
            Some("https://db.example.com".to_string())
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn malformed_log_settings_are_rejected() {
        assert!(matches!(
            CoreConfig::from_lookup(lookup(&[("OCTOPUS_LOG_LEVEL", "loud")])),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            CoreConfig::from_lookup(lookup(&[("OCTOPUS_LOG_DIR", "relative/logs")])),
            Err(ConfigError::InvalidLogDir(_))
        ));
    }
}
