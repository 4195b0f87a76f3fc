//! Application configuration
//!
//! Every section has defaults, so an empty JSON object is a valid config.
//! Unknown fields are rejected to catch typos.

use app_platform::{DisplayCapabilities, SceneConfig};
use app_state::{ThemeConfig, WeatherConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storage::KvConfig;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The contents are not a valid configuration
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Preference storage
    pub storage: KvConfig,
    /// Weather store
    pub weather: WeatherConfig,
    /// Theme store
    pub theme: ThemeConfig,
    /// Animated background
    pub scene: SceneConfig,
    /// Display capabilities reported by the host
    pub display: DisplayCapabilities,
    /// Locale list overriding OS detection, e.g. `"fr-CA, en"`
    pub locale: Option<String>,
}

impl AppConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Set the storage section
    pub fn with_storage(mut self, storage: KvConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Set the weather section
    pub fn with_weather(mut self, weather: WeatherConfig) -> Self {
        self.weather = weather;
        self
    }

    /// Set the display section
    pub fn with_display(mut self, display: DisplayCapabilities) -> Self {
        self.display = display;
        self
    }

    /// Override OS locale detection
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}
