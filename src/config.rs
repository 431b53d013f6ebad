//! Server configuration
//!
//! Resolved in three steps: an optional JSON file (every field has a
//! default), then command-line overrides, then validation. A domain must be
//! known after the merge.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::DomainKind;
use crate::observability::Severity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid log_level '{0}': expected trace, info, warn or error")]
    InvalidLogLevel(String),

    #[error("data_dir {0} is not a directory")]
    DataDirMissing(String),

    #[error("no domain configured: pass --domain or set \"domain\" in the config file")]
    MissingDomain,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "ORG_CONFIG_IO",
            ConfigError::Malformed { .. } => "ORG_CONFIG_MALFORMED",
            ConfigError::InvalidLogLevel(_) | ConfigError::DataDirMissing(_) => "ORG_CONFIG_INVALID",
            ConfigError::MissingDomain => "ORG_CONFIG_MISSING_DOMAIN",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Domain to serve
    #[serde(default)]
    pub domain: Option<DomainKind>,

    /// Directory holding `<domain>/schema.json` and `<domain>/records.json`;
    /// the embedded datasets are used when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            domain: None,
            data_dir: None,
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; each one wins over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub domain: Option<DomainKind>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ServerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
            path: path.display().to_string(),
            source,
        })
    }

    /// File (if any) plus overrides, validated
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> ConfigResult<Self> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(domain) = overrides.domain {
            self.domain = Some(domain);
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        if let Some(dir) = &self.data_dir {
            if !dir.is_dir() {
                return Err(ConfigError::DataDirMissing(dir.display().to_string()));
            }
        }

        if self.domain.is_none() {
            return Err(ConfigError::MissingDomain);
        }

        Ok(())
    }

    pub fn domain(&self) -> ConfigResult<DomainKind> {
        self.domain.ok_or(ConfigError::MissingDomain)
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}
