//! Configuration file support for version-matrix

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub colors: Colors,
}

/// Default values for report runs
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Defaults {
    /// Repository root that inventory paths and Go packages are resolved against.
    /// If not set, the current working directory is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Render structured output instead of a table
    #[serde(default)]
    pub json: bool,
}

/// Color settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Colors {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Settings {
    /// Load settings from the first file found, or defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        tracing::debug!("loaded settings from {}", path.display());

        Ok(settings)
    }

    /// Find settings file in standard locations
    /// Priority:
    /// 1. .version-matrix.toml in current directory
    /// 2. ~/.config/version-matrix/config.toml (XDG config directory)
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(".version-matrix.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("version-matrix").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Repository root, falling back to the current directory
    pub fn root(&self) -> PathBuf {
        self.defaults
            .root
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
