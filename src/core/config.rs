//! Configuration file management.
//!
//! Handles reading, writing, and validating `vaultmap.toml` files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::core::convert::NullHandling;
use crate::core::types::Alias;
use crate::error::{ConfigError, Result};

/// Project configuration stored in `vaultmap.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How entities are mapped onto secret documents
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// The `[mapping]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Reserved document field holding the type hint
    pub type_key: String,
    /// Write and read type hints at all
    pub type_hints: bool,
    /// Whether null properties are omitted or stored as JSON null
    pub null_values: NullHandling,
    /// Fall back to fully-qualified type names when no alias matches
    pub qualified_names: bool,
    /// Qualified type name to alias
    pub aliases: BTreeMap<String, Alias>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            type_key: constants::DEFAULT_TYPE_KEY.to_string(),
            type_hints: true,
            null_values: NullHandling::default(),
            qualified_names: true,
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration file path in the current directory
    pub fn config_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load and validate configuration from `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file can't be read,
    /// `ConfigError::Parse` if the TOML is malformed, or a validation error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config = Self::from_toml_str(&contents)?;

        debug!(
            aliases = config.mapping.aliases.len(),
            type_hints = config.mapping.type_hints,
            "config loaded"
        );

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving config");

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate the configuration structure and contents
    ///
    /// Checks:
    /// - The type key is non-empty when type hints are enabled
    /// - Alias type names and aliases are non-empty
    /// - No alias is used for two types
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` or `ConfigError::InvalidValue` on validation failure.
    pub fn validate(&self) -> Result<()> {
        debug!("validating config");
        let mapping = &self.mapping;

        if mapping.type_hints && mapping.type_key.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "type_key" }.into());
        }

        let mut seen = HashSet::new();
        for (type_name, alias) in &mapping.aliases {
            if type_name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "aliases",
                    reason: "empty type name".to_string(),
                }
                .into());
            }
            if alias.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "aliases",
                    reason: format!("empty alias for '{}'", type_name),
                }
                .into());
            }
            if !seen.insert(alias.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "aliases",
                    reason: format!("alias '{}' is used more than once", alias),
                }
                .into());
            }
        }

        Ok(())
    }
}
