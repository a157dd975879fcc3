//! TallyBoard configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tracker::TrackerConfig;

/// Main TallyBoard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Print the grand total after every change
    #[serde(rename = "show-totals")]
    pub show_totals: bool,

    /// One entry per tracked source
    pub trackers: Vec<TrackerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            show_totals: true,
            trackers: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: tallyboard.yml
        let local_config = PathBuf::from("tallyboard.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tallyboard/tallyboard.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tallyboard").join("tallyboard.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Any failure yields `None`; the full load reports it later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => [
                Some(PathBuf::from("tallyboard.yml")),
                dirs::config_dir().map(|dir| dir.join("tallyboard").join("tallyboard.yml")),
            ]
            .into_iter()
            .flatten()
            .find(|path| path.exists())?,
        };
        Self::load_from_file(&path).ok()?.log_level
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
