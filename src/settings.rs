//! Application settings.
//!
//! Loaded from ~/.config/surveyr/surveyr.yml or .surveyr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application settings for the surveyr CLI.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Configuration/response service settings.
    pub service: ServiceSettings,

    /// Published widget asset locations for snippet generation.
    pub assets: AssetSettings,

    /// Local storage settings.
    pub storage: StorageSettings,
}

impl Settings {
    /// Load settings with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .surveyr.yml in current directory
    /// 3. ~/.config/surveyr/surveyr.yml
    /// 4. Defaults
    pub fn load(settings_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = settings_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load settings from {}", path.display()));
        }

        // Try project settings
        let project_settings = PathBuf::from(".surveyr.yml");
        if project_settings.exists() {
            match Self::load_from_file(&project_settings) {
                Ok(settings) => {
                    log::info!("Loaded settings from .surveyr.yml");
                    return Ok(settings);
                }
                Err(e) => {
                    log::warn!("Failed to load .surveyr.yml: {}", e);
                }
            }
        }

        // Try user settings
        if let Some(config_dir) = dirs::config_dir() {
            let user_settings = config_dir.join("surveyr").join("surveyr.yml");
            if user_settings.exists() {
                match Self::load_from_file(&user_settings) {
                    Ok(settings) => {
                        log::info!("Loaded settings from {}", user_settings.display());
                        return Ok(settings);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_settings.display(), e);
                    }
                }
            }
        }

        // Use defaults
        log::info!("No settings file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read settings file")?;
        let settings: Self =
            serde_yaml::from_str(&content).context("Failed to parse settings file")?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            eyre::bail!("service.base-url must not be empty");
        }
        Ok(())
    }
}

/// Configuration/response service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the configuration/response service.
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
        }
    }
}

/// Published widget asset locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetSettings {
    /// URL of the widget stylesheet.
    #[serde(rename = "stylesheet-url")]
    pub stylesheet_url: String,

    /// URL of the widget script bundle.
    #[serde(rename = "script-url")]
    pub script_url: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            stylesheet_url: "https://cdn.surveyr.dev/widget/index.css".to_string(),
            script_url: "https://cdn.surveyr.dev/widget/index.js".to_string(),
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Override for the local data directory.
    #[serde(rename = "data-dir")]
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Resolve the local data directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("surveyr")
    }
}
