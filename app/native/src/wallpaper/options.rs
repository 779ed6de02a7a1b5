//! Shell options consumed and updated by the slideshow service.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::effect::TransitionEffect;

/// The slice of the shell's option store the slideshow service touches.
pub trait WallpaperOptions: Send + Sync {
    /// Transition effect to request from the external setter.
    fn transition(&self) -> TransitionEffect;

    /// Records the wallpaper the user most recently asked for.
    fn set_wallpaper_path(&self, path: &Path);
}

#[derive(Debug, Default)]
struct OptionsState {
    transition: TransitionEffect,
    wallpaper_path: Option<PathBuf>,
}

/// In-memory option store.
#[derive(Debug, Default)]
pub struct SharedOptions {
    state: Mutex<OptionsState>,
}

impl SharedOptions {
    /// Creates a store with the given transition.
    #[must_use]
    pub fn new(transition: TransitionEffect) -> Self {
        Self {
            state: Mutex::new(OptionsState {
                transition,
                wallpaper_path: None,
            }),
        }
    }

    /// Changes the transition used for subsequent wallpaper changes.
    pub fn set_transition(&self, transition: TransitionEffect) { self.state.lock().transition = transition; }

    /// Returns the last recorded wallpaper path.
    #[must_use]
    pub fn wallpaper_path(&self) -> Option<PathBuf> { self.state.lock().wallpaper_path.clone() }
}

impl WallpaperOptions for SharedOptions {
    fn transition(&self) -> TransitionEffect { self.state.lock().transition }

    fn set_wallpaper_path(&self, path: &Path) { self.state.lock().wallpaper_path = Some(path.to_path_buf()); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_options_roundtrip() {
        let options = SharedOptions::new(TransitionEffect::Zoom);
        assert_eq!(options.transition(), TransitionEffect::Zoom);
        assert!(options.wallpaper_path().is_none());

        options.set_wallpaper_path(Path::new("/walls/a.png"));
        options.set_transition(TransitionEffect::Wipe);
        assert_eq!(options.wallpaper_path(), Some(PathBuf::from("/walls/a.png")));
        assert_eq!(options.transition(), TransitionEffect::Wipe);
    }
}
