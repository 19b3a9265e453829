//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Environment variables (including a `.env` file)
//! - Command-line arguments

use crate::error::{Error, Result};
use courier_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request pipeline settings
    pub pipeline: PipelineConfig,

    /// Credential file; defaults to the user config directory
    pub credentials_file: Option<PathBuf>,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level used when neither `-v` nor `RUST_LOG` is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::new("http://localhost:8080"),
            credentials_file: None,
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: format!("YAML ({})", e),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: format!("JSON ({})", e),
            })?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        // A missing .env file is not an error
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let mut config = if let Some(path) = file {
            Self::from_file(path)?
        } else {
            Self::load()?
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Apply `COURIER_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.pipeline.apply_env()?;

        if let Ok(path) = std::env::var("COURIER_CREDENTIALS_FILE") {
            self.credentials_file = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".courier.yaml"),
            PathBuf::from(".courier.yml"),
            PathBuf::from(".courier.json"),
        ];

        if let Some(path) = Self::user_config_path() {
            let json = path.with_extension("json");
            paths.push(path);
            paths.push(json);
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".courier.yaml"));
            paths.push(home_dir.join(".courier.json"));
        }

        paths
    }

    /// User config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("courier").join("config.yaml"))
    }

    /// Effective credential file path
    pub fn credentials_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.credentials_file {
            return Ok(path.clone());
        }

        dirs::config_dir()
            .map(|dir| dir.join("courier").join("credentials.json"))
            .ok_or_else(|| Error::config("Unable to determine user config directory"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
