//! Folder monitor feeding the slideshow actor.
//!
//! The watcher callback runs on notify's own thread. It only classifies the
//! event and forwards it; reload scheduling happens inside the actor.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::ServiceMessage;

/// Folder changes that can alter the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderChange {
    Created,
    Deleted,
    MovedIn,
    MovedOut,
}

/// Maps a notify event kind onto a queue-relevant change.
///
/// Renames inside the folder and data, metadata or access events return
/// `None`.
#[must_use]
pub const fn classify(kind: &EventKind) -> Option<FolderChange> {
    match kind {
        EventKind::Create(_) => Some(FolderChange::Created),
        EventKind::Remove(_) => Some(FolderChange::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FolderChange::MovedIn),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(FolderChange::MovedOut),
        _ => None,
    }
}

/// Active watch on one folder. Dropping it stops the watch.
pub struct FolderMonitor {
    folder: PathBuf,
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for FolderMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderMonitor").field("folder", &self.folder).finish_non_exhaustive()
    }
}

impl FolderMonitor {
    /// Starts a non-recursive watch on `folder`.
    ///
    /// Relevant events are forwarded as [`ServiceMessage::FolderChanged`].
    /// Events are dropped once the actor is gone or its channel is full.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the folder
    /// cannot be watched.
    pub fn watch(folder: &Path, sender: mpsc::WeakSender<ServiceMessage>) -> notify::Result<Self> {
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "slideshow: folder watch error");
                    return;
                }
            };

            let Some(change) = classify(&event.kind) else {
                return;
            };

            if let Some(sender) = sender.upgrade() {
                // A full channel means a reload is already queued behind other work.
                let _ = sender.try_send(ServiceMessage::FolderChanged { change });
            }
        })?;

        watcher.watch(folder, RecursiveMode::NonRecursive)?;
        tracing::debug!(folder = %folder.display(), "slideshow: watching folder");

        Ok(Self {
            folder: folder.to_path_buf(),
            _watcher: watcher,
        })
    }

    /// Returns the watched folder.
    #[must_use]
    pub fn folder(&self) -> &Path { &self.folder }
}
