//! Configuration types for Wallshow.
//!
//! This module provides the configuration types and loading functionality.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::APP_ID;
use crate::platform::path::{cache_subdir, expand_and_resolve};
use crate::wallpaper::TransitionEffect;

/// Unit applied to `intervalValue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    /// Interval measured in minutes. This is the default unit.
    #[default]
    Minutes,
    /// Interval measured in hours.
    Hours,
    /// Interval measured in days.
    Days,
    /// Any unrecognised unit. Rotation falls back to every five minutes.
    #[serde(other)]
    Unknown,
}

impl IntervalUnit {
    /// Number of seconds in one unit, or `None` for an unknown unit.
    #[must_use]
    pub const fn seconds(self) -> Option<u64> {
        match self {
            Self::Minutes => Some(60),
            Self::Hours => Some(3_600),
            Self::Days => Some(86_400),
            Self::Unknown => None,
        }
    }
}

/// Interval used when the configured unit is not recognised.
const FALLBACK_INTERVAL: Duration = Duration::from_secs(300);

/// Slideshow configuration.
///
/// Mirrors the user-facing wallpaper options of the shell.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SlideshowConfig {
    /// Folder scanned for wallpapers when `useFolder` is true.
    /// Supports `~` and paths relative to the configuration file.
    /// Default: "~/Pictures"
    pub folder_path: String,

    /// Single wallpaper applied at startup when `useFolder` is false.
    /// Default: "" (none)
    pub single_image_path: String,

    /// Whether to rotate through `folderPath` instead of a single image.
    /// Default: false
    pub use_folder: bool,

    /// Rotation interval, expressed in `intervalUnit`.
    /// Default: 30
    pub interval_value: u64,

    /// Unit for `intervalValue`: "minutes", "hours" or "days".
    /// Default: "minutes"
    pub interval_unit: IntervalUnit,

    /// Whether the folder queue is shuffled when loaded.
    /// Default: true
    pub shuffle_enabled: bool,

    /// Transition effect name: fade, slide, zoom, pixelate, swirl or wipe.
    /// Unknown names fall back to fade.
    /// Default: "fade"
    pub transition: String,

    /// Duration in seconds of transitions rendered locally.
    /// Default: 1.0
    pub transition_duration: f64,

    /// Whether automatic rotation starts with the service.
    /// Default: false
    pub slideshow_enabled: bool,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            folder_path: "~/Pictures".to_string(),
            single_image_path: String::new(),
            use_folder: false,
            interval_value: 30,
            interval_unit: IntervalUnit::Minutes,
            shuffle_enabled: true,
            transition: TransitionEffect::Fade.name().to_string(),
            transition_duration: 1.0,
            slideshow_enabled: false,
        }
    }
}

impl SlideshowConfig {
    /// Returns the rotation interval.
    ///
    /// Unknown units fall back to five minutes. The result is never zero.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval_unit.seconds().map_or(FALLBACK_INTERVAL, |unit| {
            Duration::from_secs(self.interval_value.saturating_mul(unit).max(1))
        })
    }

    /// Returns the configured transition effect.
    #[must_use]
    pub fn effect(&self) -> TransitionEffect { TransitionEffect::from_name(&self.transition) }

    /// Returns the local transition duration, clamped to at least one frame.
    #[must_use]
    pub fn transition_duration(&self) -> Duration {
        let secs = if self.transition_duration.is_finite() {
            self.transition_duration.clamp(0.016, 3_600.0)
        } else {
            1.0
        };
        Duration::from_secs_f64(secs)
    }

    /// Resolves `folderPath`, or `None` when unset.
    #[must_use]
    pub fn folder(&self, base_dir: &Path) -> Option<PathBuf> {
        non_empty(&self.folder_path).map(|path| expand_and_resolve(path, base_dir))
    }

    /// Resolves `singleImagePath`, or `None` when unset.
    #[must_use]
    pub fn single_image(&self, base_dir: &Path) -> Option<PathBuf> {
        non_empty(&self.single_image_path).map(|path| expand_and_resolve(path, base_dir))
    }
}

/// Cache location configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Cache root for thumbnails, metadata and history.
    /// Default: "" (the platform cache directory, e.g. `~/.cache/wallshow/wallpaper`)
    pub dir: String,
}

impl CacheConfig {
    /// Resolves the cache root.
    #[must_use]
    pub fn resolve_dir(&self, base_dir: &Path) -> PathBuf {
        non_empty(&self.dir)
            .map_or_else(|| cache_subdir("wallpaper"), |dir| expand_and_resolve(dir, base_dir))
    }
}

/// External wallpaper setter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SetterConfig {
    /// Program invoked to apply a wallpaper. It receives `img <path>` and the
    /// transition flags.
    /// Default: "swww"
    pub command: String,

    /// Seconds to wait for the setter before giving up.
    /// Default: 10
    pub timeout_secs: u64,
}

impl Default for SetterConfig {
    fn default() -> Self {
        Self {
            command: "swww".to_string(),
            timeout_secs: 10,
        }
    }
}

impl SetterConfig {
    /// Returns the setter timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Colour regeneration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorsConfig {
    /// Command run after each wallpaper change, e.g. `["matugen", "image"]`.
    /// The wallpaper path is appended as the last argument.
    /// Default: [] (disabled)
    pub command: Vec<String>,
}

impl ColorsConfig {
    /// Returns whether colour regeneration is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool { self.command.first().is_some_and(|p| !p.trim().is_empty()) }
}

/// Root configuration for Wallshow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallshowConfig {
    /// JSON Schema reference, ignored at runtime.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Slideshow behaviour.
    pub slideshow: SlideshowConfig,

    /// Cache location.
    pub cache: CacheConfig,

    /// External wallpaper setter.
    pub setter: SetterConfig,

    /// Colour regeneration hook.
    pub colors: ColorsConfig,
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/{app}/config.jsonc \
         or ~/.config/{app}/config.json",
        app = APP_ID
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json` variants):
/// 1. `$XDG_CONFIG_HOME/wallshow/` if set
/// 2. `~/.config/wallshow/`
/// 3. The platform configuration directory
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let app_dir = PathBuf::from(xdg_config).join(APP_ID);
        for filename in CONFIG_FILE_NAMES {
            paths.push(app_dir.join(filename));
        }
    }

    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".config").join(APP_ID));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(APP_ID));
    }

    for app_dir in candidates {
        for filename in CONFIG_FILE_NAMES {
            let path = app_dir.join(filename);
            // XDG_CONFIG_HOME is usually ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    paths
}

/// Loads the configuration from the first existing default location.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected locations.
/// Returns `ConfigError::IoError` if a configuration file exists but could not be read.
/// Returns `ConfigError::ParseError` if the configuration file contains invalid JSON.
pub fn load_config() -> Result<(WallshowConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file does not exist.
/// Returns `ConfigError::IoError` if the file could not be read.
/// Returns `ConfigError::ParseError` if the file contains invalid JSON.
pub fn load_config_from_path(path: &Path) -> Result<(WallshowConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: WallshowConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}
