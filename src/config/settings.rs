//! User settings file (`<config dir>/deepseek/config.json`)

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use super::ClientConfig;
use crate::error::{DeepSeekError, Result};

/// Persistent defaults for the `deepseek` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Model used when none is given on the command line
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Custom API endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// HTTP proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Verbose logging enabled
    #[serde(default)]
    pub verbose: bool,
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            base_url: None,
            proxy: None,
            timeout_secs: None,
            verbose: false,
        }
    }
}

impl Settings {
    /// Load settings from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_from_path(&super::settings_path())
    }

    /// Load settings from a specific path; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| DeepSeekError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| DeepSeekError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save settings to a specific path, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Layer the file's connection defaults under an already resolved config
    #[must_use]
    pub fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if config.base_url.is_none() {
            config.base_url.clone_from(&self.base_url);
        }
        if config.proxy.is_none() {
            config.proxy.clone_from(&self.proxy);
        }
        if config.timeout.is_none() {
            config.timeout = self.timeout_secs.map(Duration::from_secs);
        }
        config
    }
}
