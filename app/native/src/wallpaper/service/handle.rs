//! Handle for communicating with the slideshow actor.
//!
//! The `SlideshowHandle` provides a cloneable interface for sending commands
//! to the actor and subscribing to slideshow events. Expected failures (a
//! missing file, an empty queue) come back as `Ok(false)`; `HandleError` only
//! reports that the actor itself is unreachable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use super::messages::{ServiceMessage, SlideshowStatus};
use crate::events::SlideshowEvent;

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// Failed to send message to actor.
    #[error("Failed to send message to slideshow service: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from slideshow service: channel closed")]
    ReceiveFailed,

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle for communicating with the slideshow actor.
///
/// This handle is cheap to clone and can be shared across tasks. The actor
/// stops once every handle is dropped.
#[derive(Clone)]
pub struct SlideshowHandle {
    sender: mpsc::Sender<ServiceMessage>,
    events: broadcast::Sender<SlideshowEvent>,
}

impl std::fmt::Debug for SlideshowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideshowHandle").finish_non_exhaustive()
    }
}

impl SlideshowHandle {
    pub(crate) const fn new(
        sender: mpsc::Sender<ServiceMessage>,
        events: broadcast::Sender<SlideshowEvent>,
    ) -> Self {
        Self { sender, events }
    }

    /// Sends a message built around a fresh response channel and awaits the reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ServiceMessage,
    ) -> Result<T, HandleError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(build(tx)).await.map_err(|_| HandleError::SendFailed)?;
        rx.await.map_err(|_| HandleError::ReceiveFailed)
    }

    /// Like [`Self::request`] but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Timeout`] if the actor does not answer in time.
    async fn request_with_timeout<T>(
        &self,
        timeout: Duration,
        build: impl FnOnce(oneshot::Sender<T>) -> ServiceMessage,
    ) -> Result<T, HandleError> {
        tokio::time::timeout(timeout, self.request(build))
            .await
            .map_err(|_| HandleError::Timeout(timeout))?
    }

    /// Sends a raw message without waiting for a reply.
    #[cfg(test)]
    pub(crate) async fn send_raw(&self, msg: ServiceMessage) {
        assert!(self.sender.send(msg).await.is_ok(), "slideshow actor is gone");
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Subscribes to slideshow events.
    ///
    /// Only events emitted after this call are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SlideshowEvent> { self.events.subscribe() }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Scans `path` and makes it the slideshow folder.
    ///
    /// Returns `false` without changing anything if `path` is not a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn set_folder(&self, path: impl Into<PathBuf>, shuffle: bool) -> Result<bool, HandleError> {
        let path = path.into();
        self.request(|respond_to| ServiceMessage::SetFolder { path, shuffle, respond_to }).await
    }

    /// Applies a wallpaper.
    ///
    /// Returns `false` without changing anything if the file does not exist.
    /// The external setter and colour regeneration run in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn set_wallpaper(&self, path: impl AsRef<Path>, update_colors: bool) -> Result<bool, HandleError> {
        let path = path.as_ref().to_path_buf();
        self.request(|respond_to| ServiceMessage::SetWallpaper { path, update_colors, respond_to })
            .await
    }

    /// Advances to the next queue entry, wrapping at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn next_wallpaper(&self) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::NextWallpaper { respond_to }).await
    }

    /// Goes back to the previous wallpaper.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn previous_wallpaper(&self) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::PreviousWallpaper { respond_to }).await
    }

    /// Starts rotating wallpapers every `interval`.
    ///
    /// Returns `false` if the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn play_slideshow(&self, interval: Duration) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::Play { interval, respond_to }).await
    }

    /// Stops rotating wallpapers. Safe to call when already paused.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn pause_slideshow(&self) -> Result<(), HandleError> {
        self.request(|respond_to| ServiceMessage::Pause { respond_to }).await
    }

    /// Plays when paused and pauses when playing. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn toggle_playback(&self, interval: Duration) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::TogglePlayback { interval, respond_to }).await
    }

    /// Shuffles the queue while keeping the current entry selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn shuffle_queue(&self) -> Result<(), HandleError> {
        self.request(|respond_to| ServiceMessage::ShuffleQueue { respond_to }).await
    }

    /// Rescans the current folder.
    ///
    /// Returns `false` if no folder is set or it cannot be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn reload_folder(&self, shuffle: bool) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::ReloadFolder { shuffle, respond_to }).await
    }

    /// Clears thumbnails, metadata, history and the current pointer.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn clear_cache(&self) -> Result<bool, HandleError> {
        self.request(|respond_to| ServiceMessage::ClearCache { respond_to }).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the observable slideshow state.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn status(&self) -> Result<SlideshowStatus, HandleError> {
        self.request(|respond_to| ServiceMessage::Status { respond_to }).await
    }

    /// Returns a copy of the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn queue(&self) -> Result<Vec<PathBuf>, HandleError> {
        self.request(|respond_to| ServiceMessage::Queue { respond_to }).await
    }

    /// Returns a copy of the history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has stopped.
    pub async fn history(&self) -> Result<Vec<PathBuf>, HandleError> {
        self.request(|respond_to| ServiceMessage::History { respond_to }).await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stops the actor after in-flight setter and colour tasks finish.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Timeout`] if shutdown takes longer than `timeout`,
    /// or another error if the actor has already stopped.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), HandleError> {
        self.request_with_timeout(timeout, |respond_to| ServiceMessage::Shutdown { respond_to }).await
    }
}
