//! Cartesia configuration file handling

use anyhow::{Context, Result};
use cartesia_app::HeadlessRunConfig;
use cartesia_scene::DEFAULT_SPACING;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cartesia.toml";

/// Top-level Cartesia configuration (cartesia.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CartesiaConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Scene size, frame rate and initial grid spacing
#[derive(Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Pixels per logical unit
    #[serde(default = "default_spacing")]
    pub spacing: f32,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_fps() -> f64 {
    60.0
}

fn default_spacing() -> f32 {
    DEFAULT_SPACING
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            spacing: default_spacing(),
        }
    }
}

/// Headless run settings
#[derive(Debug, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    #[serde(default = "default_probe_every")]
    pub probe_every_frames: u32,
    /// Where to write the JSON report, relative to the working directory
    #[serde(default)]
    pub report: Option<PathBuf>,
}

fn default_max_frames() -> u32 {
    3600
}

fn default_probe_every() -> u32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_frames: default_max_frames(),
            probe_every_frames: default_probe_every(),
            report: None,
        }
    }
}

impl CartesiaConfig {
    /// Load configuration from a file, or from cartesia.toml in a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            anyhow::bail!("No config found at {}", config_path.display());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Explicit path if given, else ./cartesia.toml when present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::load(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn run_config(&self) -> HeadlessRunConfig {
        HeadlessRunConfig {
            width: self.render.width,
            height: self.render.height,
            fps: self.render.fps,
            spacing: self.render.spacing,
            max_frames: self.run.max_frames,
            probe_every_frames: self.run.probe_every_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CartesiaConfig::from_toml("").unwrap();
        assert_eq!(config.run_config(), HeadlessRunConfig::default());
        assert!(config.run.report.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config = CartesiaConfig::from_toml(
            r#"
            [render]
            fps = 30.0
            spacing = 120.0

            [run]
            report = "out/report.json"
            "#,
        )
        .unwrap();
        let run = config.run_config();
        assert_eq!(run.fps, 30.0);
        assert_eq!(run.spacing, 120.0);
        assert_eq!(run.width, 1920);
        assert_eq!(run.max_frames, 3600);
        assert_eq!(config.run.report, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(CartesiaConfig::from_toml("[render]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_values() {
        let mut config = CartesiaConfig::default();
        config.render.height = 720;
        let text = config.to_toml().unwrap();
        let back = CartesiaConfig::from_toml(&text).unwrap();
        assert_eq!(back.render.height, 720);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        assert!(CartesiaConfig::discover(Some(Path::new("does/not/exist.toml"))).is_err());
    }
}
