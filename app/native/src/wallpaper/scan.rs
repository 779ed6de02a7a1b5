//! Folder scanning for wallpapers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::platform::path::absolutize;

/// Supported image file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tiff", "tif"];

/// Checks if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Lists all supported image files directly inside `dir`.
///
/// The scan is non-recursive. Returned paths are absolute and sorted
/// lexicographically.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_images_in_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = absolutize(dir);
    let mut images: Vec<PathBuf> = fs::read_dir(&dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort();
    Ok(images)
}
