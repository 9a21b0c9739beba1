//! Runtime configuration.
//!
//! # Responsibility
//! - Load `CoreConfig` from TOML with every field defaulted.
//! - Validate values before any service is built from them.

use crate::logging::default_log_level;
use crate::service::account_service::ActiveAccountPolicy;
use crate::service::session_service::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_REFRESH_INTERVAL};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file backing the key-value store; in-memory when absent.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    pub heartbeat_interval_ms: u64,
    pub refresh_interval_ms: u64,
    pub active_account_policy: ActiveAccountPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            heartbeat_interval_ms: duration_ms(DEFAULT_HEARTBEAT_INTERVAL),
            refresh_interval_ms: duration_ms(DEFAULT_REFRESH_INTERVAL),
            active_account_policy: ActiveAccountPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
