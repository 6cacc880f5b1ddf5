//! Configuration management (TOML)

use crate::threshold::ThresholdSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_true")]
    pub sound_alerts_enabled: bool,
    #[serde(default)]
    pub launch_at_login: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_thresholds_mb")]
    pub default_thresholds_mb: Vec<u64>,
}

fn default_true() -> bool {
    true
}

fn default_thresholds_mb() -> Vec<u64> {
    ThresholdSet::default().to_megabytes()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            sound_alerts_enabled: true,
            launch_at_login: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            default_thresholds_mb: default_thresholds_mb(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            general: GeneralConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, falling back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Config::default();
        }
        Config::load(path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> std::path::PathBuf {
        directories::ProjectDirs::from("", "", "memalert")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| std::path::PathBuf::from("config.toml"))
    }

    /// Thresholds applied to newly added targets.
    pub fn default_thresholds(&self) -> ThresholdSet {
        ThresholdSet::from_megabytes(self.monitor.default_thresholds_mb.iter().copied()).unwrap_or_else(|e| {
            warn!("Invalid default_thresholds_mb ({}), using built-in defaults", e);
            ThresholdSet::default()
        })
    }
}
