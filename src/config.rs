//! Configuration management for song conversion
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (funkin.toml)
//! - Environment variables (FUNKIN__*)
//!
//! ## Example config file (funkin.toml):
//! ```toml
//! [conversion]
//! legacy_difficulty = "hard"
//! legacy_variation = "default"
//! generated_by = "My Mod Toolkit"
//! note_style = "funkin"
//!
//! [output]
//! format = "compact"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::convert::ConversionOptions;
use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunkinConfig {
    /// Defaults for conversions that synthesize data
    #[serde(default)]
    pub conversion: ConversionOptions,

    /// How converted documents are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl FunkinConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["funkin.toml", ".funkin.toml", "config/funkin.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("me", "funkin", "funkin-schemas") {
            let xdg_config = dirs.config_dir().join("funkin.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (FUNKIN__CONVERSION__LEGACY_DIFFICULTY, ...)
        builder = builder.add_source(
            Environment::with_prefix("FUNKIN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Options handed to the converter
    pub fn conversion_options(&self) -> ConversionOptions {
        self.conversion.clone()
    }
}
