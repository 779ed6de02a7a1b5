//! Wallpaper slideshow engine.
//!
//! - [`cache`] - Thumbnails, metadata, history and the current pointer
//! - [`transition`] - Timed transition renderer with CPU frame blending
//! - [`service`] - Slideshow actor (queue, playback, folder monitor)
//! - [`setter`] - External wallpaper setter (`swww`)
//! - [`colors`] - Colour regeneration hook
//! - [`options`] - Shell option store shared with the service
//! - [`effect`] - Transition effect catalog
//! - [`scan`] - Folder scanning

pub mod cache;
pub mod colors;
pub mod effect;
pub mod options;
pub mod scan;
pub mod service;
pub mod setter;
pub mod transition;

use std::path::Path;
use std::sync::Arc;

pub use cache::{CacheError, WallpaperCache, WallpaperMetadata};
pub use effect::TransitionEffect;
pub use options::{SharedOptions, WallpaperOptions};
pub use service::{Collaborators, HandleError, SlideshowHandle, SlideshowService, SlideshowStatus};
pub use transition::{TransitionError, TransitionRenderer};

use self::colors::{ColorRegenerator, CommandColorRegenerator};
use self::setter::SwwwSetter;
use crate::config::{LoadedConfig, SlideshowConfig};

/// Opens the configured cache and spawns the slideshow service.
///
/// Returns the service handle together with the option store the service
/// writes the current wallpaper into.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be created.
pub fn spawn_from_config(loaded: &LoadedConfig) -> Result<(SlideshowHandle, Arc<SharedOptions>), CacheError> {
    let config = &loaded.config;
    let cache = WallpaperCache::open(config.cache.resolve_dir(&loaded.base_dir()))?;
    let options = Arc::new(SharedOptions::new(config.slideshow.effect()));

    let colors = CommandColorRegenerator::from_config(&config.colors)
        .map(|colors| Arc::new(colors) as Arc<dyn ColorRegenerator>);

    let handle = SlideshowService::spawn(cache, Collaborators {
        setter: Arc::new(SwwwSetter::from_config(&config.setter)),
        colors,
        options: options.clone(),
    });

    Ok((handle, options))
}

/// Applies the startup part of the slideshow configuration.
///
/// With `useFolder` the folder is loaded (and played when
/// `slideshowEnabled`); otherwise the single image, if any, is applied.
/// Returns whether anything was applied.
///
/// # Errors
///
/// Returns an error if the service has stopped.
pub async fn apply_startup(
    handle: &SlideshowHandle,
    config: &SlideshowConfig,
    base_dir: &Path,
) -> Result<bool, HandleError> {
    if config.use_folder {
        let Some(folder) = config.folder(base_dir) else {
            tracing::warn!("slideshow: useFolder is set but folderPath is empty");
            return Ok(false);
        };

        if !handle.set_folder(folder, config.shuffle_enabled).await? {
            return Ok(false);
        }

        if config.slideshow_enabled {
            handle.play_slideshow(config.interval()).await?;
        }
        return Ok(true);
    }

    match config.single_image(base_dir) {
        Some(image) => handle.set_wallpaper(image, true).await,
        None => Ok(false),
    }
}
