//! User configuration stored as JSON in `config.json`.
//!
//! Every key is optional on disk; accessors fill in defaults so an absent
//! file and an empty object behave the same.

use crate::write_atomic;
use llmcost_core::aggregate::DEFAULT_WARN_THRESHOLD;
use llmcost_core::Period;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unknown config key '{0}' (expected db_path, default_period, or warn_threshold)")]
    UnknownKey(String),
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: ConfigKey,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DbPath,
    DefaultPeriod,
    WarnThreshold,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::DbPath,
        ConfigKey::DefaultPeriod,
        ConfigKey::WarnThreshold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::DbPath => "db_path",
            ConfigKey::DefaultPeriod => "default_period",
            ConfigKey::WarnThreshold => "warn_threshold",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn_threshold: Option<f64>,
}

impl Config {
    /// Read config from `path`. Returns the default config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write config to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, json.as_bytes()).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn period(&self) -> Period {
        self.default_period.unwrap_or_default()
    }

    pub fn warn_threshold(&self) -> f64 {
        self.warn_threshold.unwrap_or(DEFAULT_WARN_THRESHOLD)
    }

    /// Parse and store `value` under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        };
        match key {
            ConfigKey::DbPath => {
                if value.trim().is_empty() {
                    return Err(invalid("path must not be empty"));
                }
                self.db_path = Some(PathBuf::from(value));
            }
            ConfigKey::DefaultPeriod => {
                let period = value.parse::<Period>().map_err(|e| invalid(&e.to_string()))?;
                self.default_period = Some(period);
            }
            ConfigKey::WarnThreshold => {
                let pct: f64 = value
                    .trim()
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| invalid("expected a number"))?;
                if !pct.is_finite() || pct <= 0.0 {
                    return Err(invalid("must be a positive percentage"));
                }
                self.warn_threshold = Some(pct);
            }
        }
        Ok(())
    }

    /// Display value for `key`, or `None` if not set.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::DbPath => self.db_path.as_ref().map(|p| p.display().to_string()),
            ConfigKey::DefaultPeriod => self.default_period.map(|p| p.to_string()),
            ConfigKey::WarnThreshold => self.warn_threshold.map(|v| v.to_string()),
        }
    }

    /// All keys that are explicitly set, in canonical order.
    pub fn entries(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .into_iter()
            .filter_map(|k| self.get(k).map(|v| (k, v)))
            .collect()
    }
}
