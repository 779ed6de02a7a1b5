//! Error types for Wallshow.
//!
//! This module provides the unified error type returned by CLI commands.
//! Component errors (`CacheError`, `TransitionError`, `SetterError`, ...) live
//! next to the component and are converted into this type at the CLI boundary.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::wallpaper::service::HandleError;
use crate::wallpaper::{CacheError, TransitionError};

/// Errors that can occur during application execution.
///
/// Serializes as `{ "kind": ..., "message": ... }` so the CLI can print
/// machine-readable failures.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum WallshowError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Cache operation failed.
    #[error("Cache error: {0}")]
    CacheError(String),
    /// Wallpaper operation failed.
    #[error("Wallpaper error: {0}")]
    WallpaperError(String),
    /// Transition rendering failed.
    #[error("Transition error: {0}")]
    TransitionError(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Communication with the slideshow service failed.
    #[error("Service error: {0}")]
    ServiceError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for WallshowError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for WallshowError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<CacheError> for WallshowError {
    fn from(err: CacheError) -> Self { Self::CacheError(err.to_string()) }
}

impl From<TransitionError> for WallshowError {
    fn from(err: TransitionError) -> Self { Self::TransitionError(err.to_string()) }
}

impl From<ConfigError> for WallshowError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<HandleError> for WallshowError {
    fn from(err: HandleError) -> Self { Self::ServiceError(err.to_string()) }
}

impl From<String> for WallshowError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for WallshowError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
