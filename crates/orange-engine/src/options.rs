//! Runtime options (orange.toml)
//!
//! Options are read from the `[runtime]` table of an `orange.toml` file.
//! Every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading runtime options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Behavior switches for a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// Lock write-once members after the first construction of an instance.
    /// When off, write-once members behave like data members.
    pub lock_write_once: bool,

    /// Display name for classes created without one
    pub default_class_name: String,

    /// Rebind functions read from data members to the private tier
    pub wrap_methods: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            lock_write_once: true,
            default_class_name: "anonymous".to_string(),
            wrap_methods: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    runtime: RuntimeOptions,
}

impl RuntimeOptions {
    /// Load options from an `orange.toml` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse options from the contents of an `orange.toml` file
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.runtime.validate()?;
        Ok(file.runtime)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_class_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "default_class_name cannot be empty".to_string(),
            ));
        }

        if self.default_class_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid default_class_name: {:?}. Must not contain whitespace",
                self.default_class_name
            )));
        }

        Ok(())
    }

    /// Serialize as an `orange.toml` `[runtime]` table
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        #[derive(Serialize)]
        struct Wrapper<'a> {
            runtime: &'a RuntimeOptions,
        }
        toml::to_string_pretty(&Wrapper { runtime: self })
    }
}
