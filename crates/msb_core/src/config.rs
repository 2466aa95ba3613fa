//! Bridge configuration, loaded from JSON.
//!
//! Every field has a default, so an empty object `{}` is a valid config. The
//! panel and the headless host both start from `BridgeConfig::default()` and
//! only override what the user changed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHARACTER_NAME: &str = "LibSM64 Mario";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Simulation units per host scene unit.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    /// Host frame rate forced while a character is live.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default)]
    pub camera_follow: bool,
    #[serde(default = "default_character_name")]
    pub character_name: String,
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f32,
    /// Explicit path to the native library; `None` uses the platform default
    /// file name next to the executable.
    #[serde(default)]
    pub library_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            tick_rate: default_tick_rate(),
            camera_follow: false,
            character_name: default_character_name(),
            dead_zone: default_dead_zone(),
            library_path: None,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err("Config validation failed: scale_factor must be > 0".to_string());
        }
        if self.tick_rate == 0 {
            return Err("Config validation failed: tick_rate must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err("Config validation failed: dead_zone must be in [0, 1)".to_string());
        }
        if self.character_name.trim().is_empty() {
            return Err("Config validation failed: character_name is empty".to_string());
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<BridgeConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: BridgeConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}

const fn default_scale_factor() -> f32 {
    50.0
}

const fn default_tick_rate() -> u32 {
    30
}

const fn default_dead_zone() -> f32 {
    0.2
}

fn default_character_name() -> String {
    DEFAULT_CHARACTER_NAME.to_string()
}
