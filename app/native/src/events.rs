//! Centralized event definitions for slideshow subscribers.
//!
//! All events published by the slideshow service are defined here so widget
//! layers and collaborators (colour generation, status bars) agree on names
//! and payloads.
//!
//! ## Naming Convention
//!
//! All events follow the pattern: `wallshow://<module>/<event-name>`
//!
//! - `wallshow://` - Prefix identifying this as a Wallshow event
//! - `<module>` - The module/feature that owns the event
//! - `<event-name>` - Descriptive kebab-case name for the event

use std::path::PathBuf;

use serde::Serialize;

/// Slideshow-related event names.
pub mod slideshow {
    /// Emitted after the active wallpaper changes.
    ///
    /// Payload: `String` - Absolute path of the new wallpaper.
    pub const WALLPAPER_CHANGED: &str = "wallshow://slideshow/wallpaper-changed";

    /// Emitted when automatic rotation starts or stops.
    ///
    /// Payload: `bool` - `true` while playing.
    pub const STATE_CHANGED: &str = "wallshow://slideshow/state-changed";

    /// Emitted whenever the queue is rebuilt or reordered.
    ///
    /// Payload: `()` (no payload)
    pub const QUEUE_UPDATED: &str = "wallshow://slideshow/queue-updated";
}

/// Typed event published on the slideshow event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum SlideshowEvent {
    /// The active wallpaper changed.
    WallpaperChanged(PathBuf),
    /// Playback started (`true`) or stopped (`false`).
    SlideshowStateChanged(bool),
    /// The queue was rebuilt or shuffled.
    QueueUpdated,
}

impl SlideshowEvent {
    /// Returns the wire name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WallpaperChanged(_) => slideshow::WALLPAPER_CHANGED,
            Self::SlideshowStateChanged(_) => slideshow::STATE_CHANGED,
            Self::QueueUpdated => slideshow::QUEUE_UPDATED,
        }
    }
}
