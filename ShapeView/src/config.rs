//! Viewer configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Palette used when neither the file nor the command line names one
pub const DEFAULT_PALETTE: &str = "ice.day.ppl";

// Default value functions for serde
fn default_palette() -> String {
    DEFAULT_PALETTE.to_string()
}
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_camera_distance() -> f32 {
    10.0
}
fn default_time_scale() -> f32 {
    1.0
}

/// Viewport and camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Distance from the camera to the shape's center
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            camera_distance: default_camera_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    /// Sequence started as soon as a model loads
    #[serde(default)]
    pub autoplay: Option<String>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            autoplay: None,
        }
    }
}

/// Persistable viewer configuration (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Directories and volume files, highest priority first
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
    #[serde(default = "default_palette")]
    pub palette: String,
    /// Model loaded at startup
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            palette: default_palette(),
            model: None,
            view: ViewSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

/// Values given on the command line, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub search_roots: Vec<PathBuf>,
    pub palette: Option<String>,
    pub model: Option<String>,
}

impl ViewerConfig {
    /// `<config dir>/shapeview/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("shapeview").join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Unreadable files and malformed TOML are errors rather than defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load from [`default_path`](Self::default_path), or the defaults.
    pub fn load_default() -> crate::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Command-line roots replace the configured list; palette and model
    /// replace their file values.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if !overrides.search_roots.is_empty() {
            self.search_roots = overrides.search_roots;
        }
        if let Some(palette) = overrides.palette {
            self.palette = palette;
        }
        if overrides.model.is_some() {
            self.model = overrides.model;
        }
    }
}
