//! Configuration module for Wallshow.
//!
//! This module provides configuration types, loading functionality and JSON
//! Schema generation. The configuration is loaded once by the caller and
//! passed down explicitly.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod types;

use std::path::{Path, PathBuf};

pub use types::{
    CacheConfig, ColorsConfig, ConfigError, IntervalUnit, SetterConfig, SlideshowConfig,
    WallshowConfig, config_paths, load_config as load_config_default, load_config_from_path,
};

/// A configuration together with the file it was read from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The parsed configuration.
    pub config: WallshowConfig,
    /// Path of the file it came from, or `None` when defaults are in use.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Directory against which relative paths in the configuration resolve.
    ///
    /// This is the configuration file's directory, or the current working
    /// directory when running on defaults.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }
}

/// Loads the configuration.
///
/// An explicit `custom` path must exist and parse. Otherwise the default
/// locations are searched, and a missing file yields the default
/// configuration. Parse failures in a default location are logged and also
/// fall back to defaults.
///
/// # Errors
///
/// Returns an error only when an explicit `custom` path cannot be loaded.
pub fn load(custom: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = custom {
        let (config, path) = load_config_from_path(path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        return Ok(LoadedConfig { config, path: Some(path) });
    }

    match load_config_default() {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(LoadedConfig { config, path: Some(path) })
        }
        Err(ConfigError::NotFound) => {
            tracing::debug!("no configuration file found, using defaults");
            Ok(LoadedConfig::default())
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            Ok(LoadedConfig::default())
        }
    }
}

/// Generates the JSON Schema of the configuration file as pretty JSON.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(WallshowConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let result = load(Some(Path::new("/nonexistent/wallshow.jsonc")));
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_base_dir_uses_config_parent() {
        let loaded = LoadedConfig {
            config: WallshowConfig::default(),
            path: Some(PathBuf::from("/home/user/.config/wallshow/config.jsonc")),
        };
        assert_eq!(loaded.base_dir(), PathBuf::from("/home/user/.config/wallshow"));
    }

    #[test]
    fn test_schema_describes_sections() {
        let schema = generate_schema();
        assert!(schema.contains("slideshow"));
        assert!(schema.contains("folderPath"));
        assert!(schema.contains("timeoutSecs"));
    }

    #[test]
    fn test_config_error_message() {
        let msg = ConfigError::NotFound.to_string();
        assert!(msg.contains("No configuration file found"));
    }
}
