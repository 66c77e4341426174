//! Configuration file support for Setwise.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/setwise/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub kudos: KudosConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Session engine tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Press duration at which a tap becomes a hold
    #[serde(default = "default_hold_threshold_ms")]
    pub hold_threshold_ms: u64,

    /// How many times a completion summary is submitted before reporting failure
    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,

    /// Used when the workout carries no calorie figure of its own
    #[serde(default = "default_calories_per_minute")]
    pub calories_per_minute: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hold_threshold_ms: default_hold_threshold_ms(),
            submit_attempts: default_submit_attempts(),
            calories_per_minute: default_calories_per_minute(),
        }
    }
}

/// Custom motivational phrases, per lifecycle event.
///
/// Empty lists fall back to the built-in defaults.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct KudosConfig {
    #[serde(default)]
    pub session_started: Vec<String>,
    #[serde(default)]
    pub set_completed: Vec<String>,
    #[serde(default)]
    pub rest_started: Vec<String>,
    #[serde(default)]
    pub exercise_completed: Vec<String>,
    #[serde(default)]
    pub session_completed: Vec<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("setwise")
}

fn default_hold_threshold_ms() -> u64 {
    800
}

fn default_submit_attempts() -> u32 {
    3
}

fn default_calories_per_minute() -> f64 {
    5.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.session.submit_attempts == 0 {
            return Err(Error::Config(
                "session.submit_attempts must be at least 1".into(),
            ));
        }
        let rate = self.session.calories_per_minute;
        if rate.is_nan() || rate < 0.0 {
            return Err(Error::Config(
                "session.calories_per_minute must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("setwise").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
