//! Registry configuration.
//!
//! Values come from an optional TOML file, then environment variables with
//! the `NAMEREG` prefix (nested keys joined by `__`, e.g.
//! `NAMEREG_FEES__UNOFFICIAL_USER_SIGN_UP=100`), then built-in defaults.

use crate::gate::AllowListGate;
use config::{Config, Environment, File};
use namereg_types::{Address, FeeSchedule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "NAMEREG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Sled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            path: PathBuf::from("./data/namereg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Addresses allowed to run operator-only operations
    pub operators: Vec<Address>,
    pub log_level: String,
    /// Fees written to a fresh store; an existing store keeps its own
    pub fees: FeeSchedule,
    pub storage: StorageConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            log_level: "info".to_string(),
            fees: FeeSchedule::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Load from `path` (if given) and `NAMEREG_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("operators")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Render as TOML, e.g. to seed a config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Gate admitting the configured operators.
    pub fn privilege_gate(&self) -> AllowListGate {
        AllowListGate::new(self.operators.iter().copied())
    }
}
