//! Configuration file handling.
//!
//! Loads configuration from `~/.config/termlens/config.toml` or a custom
//! path. Every section is optional; missing files yield defaults and
//! command-line flags override whatever was loaded.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::capture::{ResolutionTier, ZoomTiers};

/// Configuration file structure.
/// Loaded from ~/.config/termlens/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub view: ViewSection,
    #[serde(default)]
    pub render: RenderSection,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSection {
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub mirror: bool,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Quiet period before a zoom-driven capture restart, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Custom resolution tier table; empty means built-in defaults.
    #[serde(default)]
    pub tiers: Vec<TierEntry>,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            device: 0,
            fps: default_fps(),
            mirror: false,
            pixel_format: default_pixel_format(),
            ffmpeg_path: default_ffmpeg_path(),
            debounce_ms: default_debounce_ms(),
            tiers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TierEntry {
    pub max_zoom: f32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct ViewSection {
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
}

impl Default for ViewSection {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub status_bar: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            status_bar: true,
        }
    }
}

fn default_fps() -> u32 {
    30
}

fn default_pixel_format() -> String {
    "rgb24".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_zoom() -> f32 {
    1.0
}

fn default_max_zoom() -> f32 {
    8.0
}

fn default_mode() -> String {
    "ascii".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Resolution tier table from the `[capture]` section, or the
    /// built-in defaults when none were configured.
    pub fn zoom_tiers(&self) -> ZoomTiers {
        let tiers: Vec<ResolutionTier> = self
            .capture
            .tiers
            .iter()
            .map(|t| ResolutionTier {
                max_zoom: t.max_zoom,
                width: t.width,
                height: t.height,
            })
            .collect();
        ZoomTiers::new(tiers).unwrap_or_default()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    directories::ProjectDirs::from("com", "termlens", "termlens")
        .map(|d| d.config_dir().to_path_buf().join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/termlens/config.toml")
        })
}
