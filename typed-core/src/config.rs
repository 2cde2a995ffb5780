//! Configuration
//!
//! Options for building matcher registries. Every section is optional in
//! TOML; missing keys take their defaults.
//!
//! ```toml
//! [registry]
//! builtins = true
//! warn_on_malformed = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("The global matcher registry is already initialized")]
    AlreadyInitialized,
}

/// Config result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Matcher registry options.
    pub registry: RegistryConfig,
}

/// Matcher registry options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seed new registries with the built-in strategies.
    pub builtins: bool,

    /// Log a warning when a malformed strategy registration is dropped.
    /// Dropping happens either way.
    pub warn_on_malformed: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            builtins: true,
            warn_on_malformed: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
