//! Path utilities for shell-like path expansion and cache locations.
//!
//! This module provides centralized path expansion functionality,
//! supporting tilde (`~`) expansion, relative path resolution and the
//! application's cache directory.

use std::path::{Path, PathBuf};

use crate::constants::APP_ID;

/// Expands shell-like paths (tilde) to absolute paths.
///
/// The path can be:
/// - Absolute (starts with `/`): returned as-is
/// - Home-relative (starts with `~`): expanded to the user's home directory
/// - Relative: returned as-is (use `expand_and_resolve` for base directory resolution)
///
/// # Examples
///
/// ```ignore
/// use wallshow_lib::platform::path::expand;
///
/// let pictures = expand("~/Pictures");
/// assert!(!pictures.to_string_lossy().starts_with("~"));
/// ```
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

/// Expands shell-like paths and resolves relative paths against a base directory.
///
/// Used for configuration values, which are resolved relative to the
/// configuration file's directory.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = expand(path);

    if expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Returns an absolute version of `path` without touching the filesystem.
///
/// Relative paths are joined onto the current working directory. Symlinks are
/// not resolved, so the result is stable for cache-key derivation.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

/// Returns the root cache directory for the application.
///
/// Uses the platform cache directory (`~/.cache/wallshow` on Linux) with a
/// fallback to `/tmp/wallshow` if it cannot be determined.
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || PathBuf::from(format!("/tmp/{APP_ID}")),
        |cache| cache.join(APP_ID),
    )
}

/// Returns a cache subdirectory for the given component.
///
/// # Arguments
///
/// * `subdir` - The subdirectory name within the app's cache directory (e.g., `wallpaper`)
#[must_use]
pub fn cache_subdir(subdir: &str) -> PathBuf { cache_dir().join(subdir) }
