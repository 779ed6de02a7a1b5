//! Disk-backed wallpaper cache.
//!
//! Layout under the cache root:
//!
//! ```text
//! thumbnails/<key>.jpg   256px JPEG thumbnails
//! metadata.json          key -> WallpaperMetadata
//! history.json           most-recent-first wallpaper paths
//! current                pointer to the active wallpaper
//! ```
//!
//! Keys are the SHA-256 of the wallpaper's absolute path. Every write goes
//! through a temporary file in the same directory followed by a rename, so a
//! crash never leaves a half-written record behind.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::platform::path::absolutize;

/// Maximum number of entries kept in the history.
pub const MAX_HISTORY: usize = 100;

/// Longest side of a generated thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 256;

/// JPEG quality used for thumbnails.
const THUMBNAIL_QUALITY: u8 = 85;

const THUMBNAILS_DIR: &str = "thumbnails";
const METADATA_FILE: &str = "metadata.json";
const HISTORY_FILE: &str = "history.json";
const CURRENT_FILE: &str = "current";

/// Errors reported by [`WallpaperCache`].
///
/// Every cache operation is best-effort. Callers treat an error as a cache
/// miss and carry on.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The source image could not be decoded.
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The thumbnail could not be encoded.
    #[error("Failed to encode thumbnail {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// A JSON record could not be serialized.
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The source image does not exist.
    #[error("Source image not found: {0}")]
    SourceMissing(PathBuf),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// Metadata extracted from a wallpaper image.
///
/// A record is valid only while `mtime` equals the file's current
/// modification time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallpaperMetadata {
    pub path: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Width divided by height, rounded to two decimals.
    pub aspect_ratio: f64,
    /// Upper-case decoder format name, e.g. `PNG`.
    pub format: String,
    /// `L`, `LA`, `RGB`, `RGBA` or `UNKNOWN`.
    pub color_mode: String,
    pub size_bytes: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
}

/// Derives the cache key of a wallpaper path.
///
/// The key is the lowercase hex SHA-256 of the absolute path, so it is fixed
/// length and safe to use as a file name.
#[must_use]
pub fn cache_key(path: &Path) -> String {
    let absolute = absolutize(path);
    let mut hasher = Sha256::new();
    hasher.update(absolute.as_os_str().as_encoded_bytes());
    format!("{:x}", hasher.finalize())
}

/// Disk store for thumbnails, metadata, history and the current wallpaper.
#[derive(Debug)]
pub struct WallpaperCache {
    root: PathBuf,
    thumbnails_dir: PathBuf,
    metadata: HashMap<String, WallpaperMetadata>,
    history: Vec<PathBuf>,
}

impl WallpaperCache {
    /// Opens (or creates) a cache rooted at `root`.
    ///
    /// Missing or corrupt `metadata.json` and `history.json` load as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = absolutize(&root.into());
        let thumbnails_dir = root.join(THUMBNAILS_DIR);
        fs::create_dir_all(&thumbnails_dir).map_err(|err| CacheError::io(&thumbnails_dir, err))?;

        let metadata = load_json(&root.join(METADATA_FILE));
        let history = load_json(&root.join(HISTORY_FILE));

        Ok(Self {
            root,
            thumbnails_dir,
            metadata,
            history,
        })
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Returns the number of metadata records held in memory.
    #[must_use]
    pub fn cached_metadata_len(&self) -> usize { self.metadata.len() }

    // ========================================================================
    // Thumbnails
    // ========================================================================

    /// Returns where the thumbnail of `path` lives. Does not touch the disk.
    #[must_use]
    pub fn thumbnail_path(&self, path: &Path) -> PathBuf {
        self.thumbnails_dir.join(format!("{}.jpg", cache_key(path)))
    }

    /// Returns a thumbnail for `path`, generating it when missing or stale.
    ///
    /// A thumbnail at least as new as its source is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or cannot be decoded, or if
    /// the thumbnail cannot be written.
    pub fn generate_thumbnail(&self, path: &Path) -> Result<PathBuf, CacheError> {
        let source_mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|err| source_error(path, err))?;

        let thumbnail = self.thumbnail_path(path);
        let fresh = fs::metadata(&thumbnail)
            .and_then(|meta| meta.modified())
            .is_ok_and(|thumb_mtime| thumb_mtime >= source_mtime);
        if fresh {
            return Ok(thumbnail);
        }

        let image = decode(path)?;
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let (width, height) = rgb.dimensions();
        let scaled = if width > THUMBNAIL_SIZE || height > THUMBNAIL_SIZE {
            rgb.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
        } else {
            rgb
        };

        let mut temp = NamedTempFile::new_in(&self.thumbnails_dir)
            .map_err(|err| CacheError::io(&self.thumbnails_dir, err))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let encoder = JpegEncoder::new_with_quality(&mut writer, THUMBNAIL_QUALITY);
            scaled.write_with_encoder(encoder).map_err(|source| CacheError::Encode {
                path: thumbnail.clone(),
                source,
            })?;
            writer.flush().map_err(|err| CacheError::io(&thumbnail, err))?;
        }
        temp.persist(&thumbnail).map_err(|err| CacheError::io(&thumbnail, err.error))?;

        tracing::debug!(path = %path.display(), thumbnail = %thumbnail.display(), "generated thumbnail");
        Ok(thumbnail)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns metadata for `path`, re-extracting it when the file changed.
    ///
    /// A source that no longer exists yields the default (empty) record.
    /// Failing to persist a fresh record is logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the image header cannot be read.
    pub fn metadata(&mut self, path: &Path) -> Result<WallpaperMetadata, CacheError> {
        let absolute = absolutize(path);
        let Ok(file_meta) = fs::metadata(&absolute) else {
            return Ok(WallpaperMetadata::default());
        };

        let mtime = file_meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0.0, |since| since.as_secs_f64());

        let key = cache_key(&absolute);
        let cached = self.metadata.get(&key).filter(|meta| meta.mtime.to_bits() == mtime.to_bits());
        if let Some(cached) = cached {
            return Ok(cached.clone());
        }

        let record = extract_metadata(&absolute, file_meta.len(), mtime)?;
        self.metadata.insert(key, record.clone());
        if let Err(err) = self.save_metadata() {
            tracing::warn!(error = %err, "failed to persist wallpaper metadata");
        }

        Ok(record)
    }

    fn save_metadata(&self) -> Result<(), CacheError> {
        save_json(&self.root, &self.root.join(METADATA_FILE), &self.metadata)
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Moves `path` to the front of the history, trimming it to [`MAX_HISTORY`].
    ///
    /// The in-memory history is always updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the history could not be persisted.
    pub fn add_to_history(&mut self, path: &Path) -> Result<(), CacheError> {
        let absolute = absolutize(path);
        self.history.retain(|entry| *entry != absolute);
        self.history.insert(0, absolute);
        self.history.truncate(MAX_HISTORY);
        self.save_history()
    }

    /// Returns a copy of the history, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<PathBuf> { self.history.clone() }

    /// Returns the history entry just older than `current`.
    ///
    /// Returns `None` if `current` is not in the history or is its oldest entry.
    #[must_use]
    pub fn previous_wallpaper(&self, current: &Path) -> Option<PathBuf> {
        let current = absolutize(current);
        let position = self.history.iter().position(|entry| *entry == current)?;
        self.history.get(position + 1).cloned()
    }

    fn save_history(&self) -> Result<(), CacheError> {
        save_json(&self.root, &self.root.join(HISTORY_FILE), &self.history)
    }

    // ========================================================================
    // Current wallpaper pointer
    // ========================================================================

    /// Atomically points `current` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer cannot be written.
    pub fn set_current_wallpaper(&self, path: &Path) -> Result<(), CacheError> {
        let absolute = absolutize(path);
        let pointer = self.root.join(CURRENT_FILE);
        write_pointer(&self.root, &pointer, &absolute)
    }

    /// Returns the active wallpaper, or `None` when unset or unresolvable.
    #[must_use]
    pub fn current_wallpaper(&self) -> Option<PathBuf> {
        read_pointer(&self.root.join(CURRENT_FILE)).filter(|path| path.exists())
    }

    // ========================================================================
    // Clearing
    // ========================================================================

    /// Removes thumbnails and the pointer, and empties metadata and history.
    ///
    /// Safe to call repeatedly. Returns the approximate number of bytes freed.
    ///
    /// # Errors
    ///
    /// Returns an error if a file could not be removed or the empty records
    /// could not be written. The in-memory state is reset regardless.
    pub fn clear(&mut self) -> Result<u64, CacheError> {
        self.metadata.clear();
        self.history.clear();

        let freed = dir_size(&self.thumbnails_dir);
        if self.thumbnails_dir.exists() {
            fs::remove_dir_all(&self.thumbnails_dir)
                .map_err(|err| CacheError::io(&self.thumbnails_dir, err))?;
        }
        fs::create_dir_all(&self.thumbnails_dir)
            .map_err(|err| CacheError::io(&self.thumbnails_dir, err))?;

        let pointer = self.root.join(CURRENT_FILE);
        match fs::remove_file(&pointer) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(CacheError::io(&pointer, err)),
        }

        self.save_metadata()?;
        self.save_history()?;

        tracing::info!(root = %self.root.display(), freed, "cleared wallpaper cache");
        Ok(freed)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn source_error(path: &Path, err: io::Error) -> CacheError {
    if err.kind() == io::ErrorKind::NotFound {
        CacheError::SourceMissing(path.to_path_buf())
    } else {
        CacheError::io(path, err)
    }
}

fn decode(path: &Path) -> Result<DynamicImage, CacheError> {
    ImageReader::open(path)
        .map_err(|err| source_error(path, err))?
        .with_guessed_format()
        .map_err(|err| CacheError::io(path, err))?
        .decode()
        .map_err(|source| CacheError::Decode { path: path.to_path_buf(), source })
}

fn extract_metadata(path: &Path, size_bytes: u64, mtime: f64) -> Result<WallpaperMetadata, CacheError> {
    let reader = ImageReader::open(path)
        .map_err(|err| source_error(path, err))?
        .with_guessed_format()
        .map_err(|err| CacheError::io(path, err))?;

    let format = reader
        .format()
        .map_or_else(|| "UNKNOWN".to_string(), |format| format!("{format:?}").to_uppercase());
    let decoder = reader
        .into_decoder()
        .map_err(|source| CacheError::Decode { path: path.to_path_buf(), source })?;

    let (width, height) = decoder.dimensions();
    let aspect_ratio = if height == 0 {
        0.0
    } else {
        (f64::from(width) / f64::from(height) * 100.0).round() / 100.0
    };

    Ok(WallpaperMetadata {
        path: path.display().to_string(),
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        width,
        height,
        aspect_ratio,
        format,
        color_mode: color_mode(decoder.color_type()).to_string(),
        size_bytes,
        mtime,
    })
}

const fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "UNKNOWN",
    }
}

/// Loads a JSON record, falling back to the default when missing or corrupt.
fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return T::default(),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "failed to read cache file");
            return T::default();
        }
    };

    serde_json::from_reader(io::BufReader::new(file)).unwrap_or_else(|err| {
        tracing::warn!(error = %err, path = %path.display(), "ignoring corrupt cache file");
        T::default()
    })
}

fn save_json<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), CacheError> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| CacheError::io(dir, err))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|source| CacheError::Serialize { path: path.to_path_buf(), source })?;
        writer.flush().map_err(|err| CacheError::io(path, err))?;
    }
    temp.persist(path).map_err(|err| CacheError::io(path, err.error))?;
    Ok(())
}

#[cfg(unix)]
fn write_pointer(dir: &Path, pointer: &Path, target: &Path) -> Result<(), CacheError> {
    let staging = dir.join(format!(".{CURRENT_FILE}.tmp"));
    match fs::remove_file(&staging) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(CacheError::io(&staging, err)),
    }
    std::os::unix::fs::symlink(target, &staging).map_err(|err| CacheError::io(&staging, err))?;
    fs::rename(&staging, pointer).map_err(|err| CacheError::io(pointer, err))
}

#[cfg(not(unix))]
fn write_pointer(dir: &Path, pointer: &Path, target: &Path) -> Result<(), CacheError> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| CacheError::io(dir, err))?;
    writeln!(temp, "{}", target.display()).map_err(|err| CacheError::io(pointer, err))?;
    temp.persist(pointer).map_err(|err| CacheError::io(pointer, err.error))?;
    Ok(())
}

#[cfg(unix)]
fn read_pointer(pointer: &Path) -> Option<PathBuf> { fs::read_link(pointer).ok() }

#[cfg(not(unix))]
fn read_pointer(pointer: &Path) -> Option<PathBuf> {
    let contents = fs::read_to_string(pointer).ok()?;
    let line = contents.lines().next()?.trim();
    (!line.is_empty()).then(|| PathBuf::from(line))
}

/// Calculates the total size of a directory in bytes.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map(|meta| meta.len()).unwrap_or(0)
            }
        })
        .sum()
}

/// Formats a byte count as a human-readable string.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for human-readable output
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
