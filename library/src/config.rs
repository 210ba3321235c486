use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::editor::command::EditorCommand;
use crate::error::EngineError;

const CONFIG_FILE_NAME: &str = "engine.toml";

/// Tunables for editing, hit-testing and zoom.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Shortest clip any edit may produce, in seconds.
    pub min_duration: f64,
    /// Splits closer than this to either edge are refused.
    pub split_epsilon: f64,
    pub edge_margin_px: f32,
    /// Freehand creation commits only once the pointer travelled further than this.
    pub create_threshold_px: f32,
    pub default_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_step: f32,
    pub min_content_width: f32,
    pub unknown_speaker: String,
    pub caption_tag: String,
    pub shortcuts: BTreeMap<String, EditorCommand>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_duration: 0.2,
            split_epsilon: 0.1,
            edge_margin_px: 5.0,
            create_threshold_px: 4.0,
            default_scale: 20.0,
            min_scale: 1.0,
            max_scale: 200.0,
            zoom_step: 1.25,
            min_content_width: 1000.0,
            unknown_speaker: "Unknown".to_string(),
            caption_tag: "Caption".to_string(),
            shortcuts: default_shortcuts(),
        }
    }
}

fn default_shortcuts() -> BTreeMap<String, EditorCommand> {
    [
        ("Delete", EditorCommand::DeleteSelection),
        ("Backspace", EditorCommand::DeleteSelection),
        ("KeyS", EditorCommand::Split),
        ("KeyM", EditorCommand::Merge),
        ("KeyA", EditorCommand::AcceptSelection),
        ("Escape", EditorCommand::CancelGesture),
        ("Equal", EditorCommand::ZoomIn),
        ("Minus", EditorCommand::ZoomOut),
    ]
    .into_iter()
    .map(|(key, cmd)| (key.to_string(), cmd))
    .collect()
}

impl EngineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, EngineError> {
        let toml_str = fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.min_duration.is_finite() && self.min_duration > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            )));
        }
        if !(self.split_epsilon.is_finite() && self.split_epsilon >= 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "split_epsilon must not be negative, got {}",
                self.split_epsilon
            )));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(EngineError::InvalidArgument(format!(
                "scale range {}..{} is empty or not positive",
                self.min_scale, self.max_scale
            )));
        }
        if self.zoom_step <= 1.0 {
            return Err(EngineError::InvalidArgument(format!(
                "zoom_step must be greater than 1, got {}",
                self.zoom_step
            )));
        }
        if self.edge_margin_px < 0.0 || self.create_threshold_px < 0.0 {
            return Err(EngineError::InvalidArgument(
                "pixel margins must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn command_for_key(&self, key: &str) -> Option<EditorCommand> {
        self.shortcuts.get(key).copied()
    }
}

fn get_config_path() -> Option<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("io", "annotation", "annotation_engine") {
        let config_dir = proj_dirs.config_dir();
        if !config_dir.exists() {
            if let Err(e) = fs::create_dir_all(config_dir) {
                error!("Failed to create config directory: {}", e);
                return None;
            }
        }
        return Some(config_dir.join(CONFIG_FILE_NAME));
    }
    None
}

pub fn save_config(config: &EngineConfig) {
    if let Some(path) = get_config_path() {
        match config.to_toml_string() {
            Ok(toml_str) => {
                if let Err(e) = fs::write(&path, toml_str) {
                    error!("Failed to write config file: {}", e);
                } else {
                    info!("Engine config saved to {}", path.display());
                }
            }
            Err(e) => {
                error!("Failed to serialize config: {}", e);
            }
        }
    }
}

/// Loads the user config, falling back to defaults on any failure.
pub fn load_config() -> EngineConfig {
    if let Some(path) = get_config_path() {
        if path.exists() {
            match EngineConfig::load_from(&path) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to load {}, using defaults: {}", path.display(), e);
                }
            }
        }
    }
    EngineConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_duration, 0.2);
        assert_eq!(config.split_epsilon, 0.1);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = EngineConfig::from_toml_str("min_duration = 0.5\nmax_scale = 80.0\n").unwrap();
        assert_eq!(config.min_duration, 0.5);
        assert_eq!(config.max_scale, 80.0);
        assert_eq!(config.edge_margin_px, 5.0);
        assert_eq!(config.command_for_key("KeyS"), Some(EditorCommand::Split));
    }

    #[test]
    fn shortcuts_can_be_rebound() {
        let config = EngineConfig::from_toml_str("[shortcuts]\nKeyX = \"split\"\n").unwrap();
        assert_eq!(config.command_for_key("KeyX"), Some(EditorCommand::Split));
        assert_eq!(config.command_for_key("KeyS"), None);
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let err = EngineConfig::from_toml_str("min_scale = 50.0\nmax_scale = 10.0\n");
        assert!(matches!(err, Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn toml_roundtrip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
