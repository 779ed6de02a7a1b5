//! Message types for the slideshow actor.
//!
//! Public commands carry a `respond_to` channel and are produced by
//! [`SlideshowHandle`](super::SlideshowHandle). Internal messages come from
//! the service's own timer, debounce and watcher tasks.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;

use super::monitor::FolderChange;

/// Snapshot of the observable slideshow state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideshowStatus {
    /// Wallpaper the cache pointer resolves to.
    pub current_wallpaper: Option<PathBuf>,
    /// Whether the playback timer is armed.
    pub is_playing: bool,
    /// Number of entries in the queue.
    pub queue_length: usize,
    /// Position of the current entry in the queue.
    pub current_index: usize,
    /// Queue entry one position ahead of the current one.
    pub next_wallpaper_preview: Option<PathBuf>,
    /// Folder the queue was scanned from.
    pub folder: Option<PathBuf>,
}

/// Messages processed by the slideshow actor.
#[derive(Debug)]
pub enum ServiceMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Commands
    // ════════════════════════════════════════════════════════════════════════
    /// Scan `path` and replace the queue.
    SetFolder {
        path: PathBuf,
        shuffle: bool,
        respond_to: oneshot::Sender<bool>,
    },

    /// Apply a single wallpaper.
    SetWallpaper {
        path: PathBuf,
        update_colors: bool,
        respond_to: oneshot::Sender<bool>,
    },

    /// Advance to the next queue entry.
    NextWallpaper { respond_to: oneshot::Sender<bool> },

    /// Go back through history, or the queue when history has nothing older.
    PreviousWallpaper { respond_to: oneshot::Sender<bool> },

    /// Start automatic rotation.
    Play {
        interval: Duration,
        respond_to: oneshot::Sender<bool>,
    },

    /// Stop automatic rotation.
    Pause { respond_to: oneshot::Sender<()> },

    /// Play when paused, pause when playing. Responds with the new state.
    TogglePlayback {
        interval: Duration,
        respond_to: oneshot::Sender<bool>,
    },

    /// Shuffle the queue, keeping the current entry selected.
    ShuffleQueue { respond_to: oneshot::Sender<()> },

    /// Rescan the current folder.
    ReloadFolder {
        shuffle: bool,
        respond_to: oneshot::Sender<bool>,
    },

    /// Wipe the wallpaper cache.
    ClearCache { respond_to: oneshot::Sender<bool> },

    // ════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════
    /// Get the observable state.
    Status { respond_to: oneshot::Sender<SlideshowStatus> },

    /// Get a copy of the queue.
    Queue { respond_to: oneshot::Sender<Vec<PathBuf>> },

    /// Get a copy of the history, most recent first.
    History { respond_to: oneshot::Sender<Vec<PathBuf>> },

    // ════════════════════════════════════════════════════════════════════════
    // Internal
    // ════════════════════════════════════════════════════════════════════════
    /// The playback ticker fired.
    TimerTick { generation: u64 },

    /// The folder monitor saw a relevant change.
    FolderChanged { change: FolderChange },

    /// The debounce window for a folder reload elapsed.
    ReloadDue { generation: u64 },

    /// Generate the thumbnail for a freshly applied wallpaper.
    GenerateThumbnail { path: PathBuf },

    // ════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════
    /// Cancel timers, wait for in-flight tasks and stop the actor.
    Shutdown { respond_to: oneshot::Sender<()> },
}

impl ServiceMessage {
    /// Returns the message name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetFolder { .. } => "SetFolder",
            Self::SetWallpaper { .. } => "SetWallpaper",
            Self::NextWallpaper { .. } => "NextWallpaper",
            Self::PreviousWallpaper { .. } => "PreviousWallpaper",
            Self::Play { .. } => "Play",
            Self::Pause { .. } => "Pause",
            Self::TogglePlayback { .. } => "TogglePlayback",
            Self::ShuffleQueue { .. } => "ShuffleQueue",
            Self::ReloadFolder { .. } => "ReloadFolder",
            Self::ClearCache { .. } => "ClearCache",
            Self::Status { .. } => "Status",
            Self::Queue { .. } => "Queue",
            Self::History { .. } => "History",
            Self::TimerTick { .. } => "TimerTick",
            Self::FolderChanged { .. } => "FolderChanged",
            Self::ReloadDue { .. } => "ReloadDue",
            Self::GenerateThumbnail { .. } => "GenerateThumbnail",
            Self::Shutdown { .. } => "Shutdown",
        }
    }
}
