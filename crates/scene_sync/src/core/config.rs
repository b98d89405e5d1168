//! # Unified Configuration System
//!
//! All configuration structures for the scene synchronisation core live here:
//! logging, identifier matching, DEF/USE aliasing and attachment setup.
//!
//! ## Design Goals
//!
//! - **Centralized**: All configuration types in one place for easy discovery
//! - **Serializable**: Support for multiple config file formats (TOML, RON)
//! - **Type Safe**: Strong typing with validation and defaults

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::scene::IdMatching;

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter, overridden by `RUST_LOG`
    pub level: String,
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self {
            level: "info".to_string(),
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Identifier Configuration
///
/// Controls how external ids are found inside node and attachment names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Separator between several ids collapsed onto one name
    pub name_separator: String,
    /// Matching policy applied to names
    pub matching: IdMatching,
}

impl IdentifierConfig {
    /// Create a new identifier configuration
    pub fn new() -> Self {
        Self {
            name_separator: ";".to_string(),
            matching: IdMatching::Token,
        }
    }

    /// Set the matching policy
    pub fn with_matching(mut self, matching: IdMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Set the name separator
    pub fn with_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.name_separator = separator.into();
        self
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Alias Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Separator between target ids inside a `USE` metadata field
    pub use_separator: String,
}

impl AliasConfig {
    /// Create a new alias configuration
    pub fn new() -> Self {
        Self {
            use_separator: ";".to_string(),
        }
    }

    /// Set the `USE` separator
    pub fn with_use_separator(mut self, separator: impl Into<String>) -> Self {
        self.use_separator = separator.into();
        self
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Attachment Setup Configuration
///
/// Flags applied to meshes by the standard attachment setup after each load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Whether loaded meshes cast shadows
    pub cast_shadows: bool,
    /// Whether loaded meshes receive shadows
    pub receive_shadows: bool,
}

impl SetupConfig {
    /// Create a new setup configuration
    pub fn new() -> Self {
        Self {
            cast_shadows: true,
            receive_shadows: true,
        }
    }

    /// Configure shadow flags
    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadows = cast;
        self.receive_shadows = receive;
        self
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Scene Sync Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSyncConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Identifier matching configuration
    pub identifiers: IdentifierConfig,
    /// DEF/USE alias configuration
    pub aliasing: AliasConfig,
    /// Attachment setup configuration
    pub setup: SetupConfig,
}

impl SceneSyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the identifier configuration
    pub fn with_identifiers(mut self, identifiers: IdentifierConfig) -> Self {
        self.identifiers = identifiers;
        self
    }

    /// Replace the alias configuration
    pub fn with_aliasing(mut self, aliasing: AliasConfig) -> Self {
        self.aliasing = aliasing;
        self
    }

    /// Replace the setup configuration
    pub fn with_setup(mut self, setup: SetupConfig) -> Self {
        self.setup = setup;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.identifiers.name_separator.is_empty() {
            return Err("Name separator cannot be empty".to_string());
        }
        if self.aliasing.use_separator.is_empty() {
            return Err("USE separator cannot be empty".to_string());
        }
        if self.identifiers.name_separator.contains('n') {
            return Err("Name separator cannot contain the id prefix 'n'".to_string());
        }
        Ok(())
    }

    /// Install the `env_logger` backend with the configured level
    pub fn init_logging(&self) -> Result<(), log::SetLoggerError> {
        crate::foundation::logging::init_with_level(&self.logging.level)
    }

    /// Load a configuration file and validate it
    pub fn load_validated(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

impl Config for SceneSyncConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_default_config_is_valid() {
        let config = SceneSyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.identifiers.matching, IdMatching::Token);
        assert_eq!(config.identifiers.name_separator, ";");
    }

    #[test]
    fn test_empty_separator_rejected() {
        let config = SceneSyncConfig::default()
            .with_aliasing(AliasConfig::new().with_use_separator(""));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let contents = r#"
            [identifiers]
            matching = "Substring"

            [setup]
            cast_shadows = false
        "#;
        let config = SceneSyncConfig::from_str_as(contents, ConfigFormat::Toml).unwrap();

        assert_eq!(config.identifiers.matching, IdMatching::Substring);
        assert_eq!(config.identifiers.name_separator, ";");
        assert!(!config.setup.cast_shadows);
        assert!(config.setup.receive_shadows);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_sync.ron");

        let config = SceneSyncConfig::default()
            .with_identifiers(IdentifierConfig::new().with_name_separator("|"));
        config.save_to_file(&path).unwrap();

        let loaded = SceneSyncConfig::load_validated(&path).unwrap();
        assert_eq!(loaded.identifiers.name_separator, "|");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SceneSyncConfig::load_from_file("scene_sync.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
