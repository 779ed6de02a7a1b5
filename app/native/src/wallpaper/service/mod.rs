//! Slideshow service actor.
//!
//! The service owns the queue, the playback ticker, the folder monitor and
//! the wallpaper cache, and processes messages sequentially. The external
//! setter and colour regeneration run as background tasks so no command
//! waits on another process.
//!
//! # Timers
//!
//! The playback ticker and the debounced folder reload are separate tokio
//! tasks that post messages back to the actor. Each carries a generation
//! number; re-arming aborts the old task and bumps the generation, so a tick
//! that was already queued is recognised as stale and dropped.
//!
//! # Panic Recovery
//!
//! A panic inside a message handler is caught and logged, and the actor
//! keeps processing subsequent messages.

mod handle;
mod messages;
pub mod monitor;
pub mod queue;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use handle::{HandleError, SlideshowHandle};
pub use messages::{ServiceMessage, SlideshowStatus};
use monitor::FolderMonitor;
use queue::Queue;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use super::cache::{WallpaperCache, format_bytes};
use super::colors::ColorRegenerator;
use super::options::WallpaperOptions;
use super::scan::list_images_in_directory;
use super::setter::WallpaperSetter;
use crate::events::SlideshowEvent;
use crate::platform::path::absolutize;

/// Channel buffer size for the slideshow actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Capacity of the event broadcast channel.
const EVENT_BUFFER_SIZE: usize = 64;

/// Quiet period before a folder change triggers a reload.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Shortest playback interval the ticker accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// External collaborators the service drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Applies wallpapers on screen.
    pub setter: Arc<dyn WallpaperSetter>,
    /// Regenerates the colour scheme, when configured.
    pub colors: Option<Arc<dyn ColorRegenerator>>,
    /// Shell option store for the transition and current wallpaper.
    pub options: Arc<dyn WallpaperOptions>,
}

/// A cancellable background timer task.
struct Scheduled {
    generation: u64,
    task: JoinHandle<()>,
}

impl Scheduled {
    fn cancel(self) { self.task.abort(); }
}

/// The slideshow actor.
pub struct SlideshowService {
    cache: WallpaperCache,
    collaborators: Collaborators,
    queue: Queue,
    folder: Option<PathBuf>,
    monitor: Option<FolderMonitor>,

    /// Playback ticker, present while playing.
    ticker: Option<Scheduled>,
    /// Pending debounced reload.
    reload: Option<Scheduled>,
    next_generation: u64,

    /// In-flight setter and colour tasks.
    tasks: JoinSet<()>,

    receiver: mpsc::Receiver<ServiceMessage>,
    /// Weak so that dropping every handle stops the actor.
    sender: mpsc::WeakSender<ServiceMessage>,
    events: broadcast::Sender<SlideshowEvent>,
}

impl SlideshowService {
    /// Spawns the actor on the current tokio runtime and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(cache: WallpaperCache, collaborators: Collaborators) -> SlideshowHandle {
        tracing::debug!(cache = %cache.root().display(), "slideshow: spawning service actor");
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);

        let actor = Self {
            cache,
            collaborators,
            queue: Queue::default(),
            folder: None,
            monitor: None,
            ticker: None,
            reload: None,
            next_generation: 0,
            tasks: JoinSet::new(),
            receiver,
            sender: sender.downgrade(),
            events: events.clone(),
        };

        tokio::spawn(actor.run());

        SlideshowHandle::new(sender, events)
    }

    /// Runs the actor's message loop.
    async fn run(mut self) {
        tracing::trace!("slideshow: actor message loop starting");

        while let Some(msg) = self.receiver.recv().await {
            if let ServiceMessage::Shutdown { respond_to } = msg {
                self.shutdown().await;
                let _ = respond_to.send(());
                tracing::debug!("slideshow: actor shut down");
                return;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| self.handle_message(msg)));

            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());

                tracing::error!(msg = msg_name, panic = %panic_msg, "slideshow: PANIC in actor");
            }

            self.reap_tasks();
        }

        tracing::debug!("slideshow: channel closed, exiting");
    }

    /// Handles a single message.
    fn handle_message(&mut self, msg: ServiceMessage) {
        match msg {
            // Commands
            ServiceMessage::SetFolder { path, shuffle, respond_to } => {
                let _ = respond_to.send(self.set_folder(&path, shuffle));
            }
            ServiceMessage::SetWallpaper { path, update_colors, respond_to } => {
                let _ = respond_to.send(self.set_wallpaper(&path, update_colors));
            }
            ServiceMessage::NextWallpaper { respond_to } => {
                let _ = respond_to.send(self.next_wallpaper());
            }
            ServiceMessage::PreviousWallpaper { respond_to } => {
                let _ = respond_to.send(self.previous_wallpaper());
            }
            ServiceMessage::Play { interval, respond_to } => {
                let _ = respond_to.send(self.play(interval));
            }
            ServiceMessage::Pause { respond_to } => {
                self.pause();
                let _ = respond_to.send(());
            }
            ServiceMessage::TogglePlayback { interval, respond_to } => {
                if self.is_playing() {
                    self.pause();
                } else {
                    self.play(interval);
                }
                let _ = respond_to.send(self.is_playing());
            }
            ServiceMessage::ShuffleQueue { respond_to } => {
                self.shuffle_queue();
                let _ = respond_to.send(());
            }
            ServiceMessage::ReloadFolder { shuffle, respond_to } => {
                let _ = respond_to.send(self.reload_folder(shuffle));
            }
            ServiceMessage::ClearCache { respond_to } => {
                let _ = respond_to.send(self.clear_cache());
            }

            // Queries
            ServiceMessage::Status { respond_to } => {
                let _ = respond_to.send(self.status());
            }
            ServiceMessage::Queue { respond_to } => {
                let _ = respond_to.send(self.queue.entries().to_vec());
            }
            ServiceMessage::History { respond_to } => {
                let _ = respond_to.send(self.cache.history());
            }

            // Internal
            ServiceMessage::TimerTick { generation } => self.on_timer_tick(generation),
            ServiceMessage::FolderChanged { change } => {
                tracing::debug!(?change, "slideshow: folder changed");
                self.schedule_reload();
            }
            ServiceMessage::ReloadDue { generation } => self.on_reload_due(generation),
            ServiceMessage::GenerateThumbnail { path } => {
                if let Err(err) = self.cache.generate_thumbnail(&path) {
                    tracing::warn!(error = %err, path = %path.display(), "slideshow: thumbnail generation failed");
                }
            }

            // Handled in `run`
            ServiceMessage::Shutdown { respond_to } => {
                let _ = respond_to.send(());
            }
        }
    }

    // ========================================================================
    // Folder and queue
    // ========================================================================

    fn set_folder(&mut self, path: &Path, shuffle: bool) -> bool {
        let folder = absolutize(path);
        if !folder.is_dir() {
            tracing::warn!(folder = %folder.display(), "slideshow: not a directory");
            return false;
        }

        let entries = match list_images_in_directory(&folder) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, folder = %folder.display(), "slideshow: failed to scan folder");
                return false;
            }
        };

        self.cancel_reload();
        self.monitor = None;
        self.queue.replace(entries, shuffle);
        self.folder = Some(folder.clone());

        self.monitor = match FolderMonitor::watch(&folder, self.sender.clone()) {
            Ok(monitor) => Some(monitor),
            Err(err) => {
                tracing::warn!(error = %err, folder = %folder.display(), "slideshow: failed to watch folder");
                None
            }
        };

        tracing::info!(
            folder = %folder.display(),
            count = self.queue.len(),
            shuffle,
            "slideshow: loaded folder"
        );
        self.emit(SlideshowEvent::QueueUpdated);
        true
    }

    /// Rescans the current folder, keeping the current entry selected when
    /// it is still present.
    fn reload_folder(&mut self, shuffle: bool) -> bool {
        let Some(folder) = self.folder.clone() else {
            tracing::debug!("slideshow: no folder to reload");
            return false;
        };

        let entries = match list_images_in_directory(&folder) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, folder = %folder.display(), "slideshow: failed to rescan folder");
                return false;
            }
        };

        let current = self.queue.current().cloned();
        self.queue.replace(entries, shuffle);
        if let Some(current) = current {
            self.queue.select(&current);
        }

        tracing::info!(folder = %folder.display(), count = self.queue.len(), "slideshow: reloaded folder");
        self.emit(SlideshowEvent::QueueUpdated);
        true
    }

    fn shuffle_queue(&mut self) {
        self.queue.shuffle();
        tracing::debug!(index = self.queue.index(), "slideshow: shuffled queue");
        self.emit(SlideshowEvent::QueueUpdated);
    }

    // ========================================================================
    // Wallpaper changes
    // ========================================================================

    fn set_wallpaper(&mut self, path: &Path, update_colors: bool) -> bool {
        let path = absolutize(path);
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "slideshow: wallpaper does not exist");
            return false;
        }

        self.dispatch_setter(&path);

        if let Err(err) = self.cache.set_current_wallpaper(&path) {
            tracing::warn!(error = %err, "slideshow: failed to update current wallpaper pointer");
        }
        if let Err(err) = self.cache.add_to_history(&path) {
            tracing::warn!(error = %err, "slideshow: failed to persist history");
        }
        self.queue.select(&path);

        self.queue_thumbnail(path.clone());

        tracing::info!(path = %path.display(), "slideshow: wallpaper changed");
        self.emit(SlideshowEvent::WallpaperChanged(path.clone()));

        if update_colors {
            self.dispatch_colors(&path);
        }

        true
    }

    fn next_wallpaper(&mut self) -> bool {
        let Some(next) = self.queue.peek_next().cloned() else {
            tracing::debug!("slideshow: queue is empty");
            return false;
        };
        self.set_wallpaper(&next, true)
    }

    fn previous_wallpaper(&mut self) -> bool {
        let from_history = self
            .cache
            .current_wallpaper()
            .and_then(|current| self.cache.previous_wallpaper(&current))
            .filter(|path| path.is_file());

        if let Some(previous) = from_history {
            return self.set_wallpaper(&previous, true);
        }

        let Some(previous) = self.queue.peek_previous().cloned() else {
            tracing::debug!("slideshow: nothing to go back to");
            return false;
        };
        self.set_wallpaper(&previous, true)
    }

    /// Runs the external setter in the background.
    ///
    /// The option store is updated whether or not the setter succeeds.
    fn dispatch_setter(&mut self, path: &Path) {
        let effect = self.collaborators.options.transition();
        let apply = self.collaborators.setter.apply(path, effect);
        let options = Arc::clone(&self.collaborators.options);
        let path = path.to_path_buf();

        self.tasks.spawn(async move {
            if let Err(err) = apply.await {
                tracing::warn!(error = %err, path = %path.display(), "slideshow: external setter failed");
            }
            options.set_wallpaper_path(&path);
        });
    }

    fn dispatch_colors(&mut self, path: &Path) {
        let Some(colors) = &self.collaborators.colors else {
            return;
        };

        let regenerate = colors.regenerate(path);
        self.tasks.spawn(async move {
            if let Err(err) = regenerate.await {
                tracing::warn!(error = %err, "slideshow: colour regeneration failed");
            }
        });
    }

    /// Posts a thumbnail job that runs after the current message.
    fn queue_thumbnail(&self, path: PathBuf) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };

        if sender.try_send(ServiceMessage::GenerateThumbnail { path }).is_err() {
            tracing::debug!("slideshow: channel full, skipping thumbnail job");
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    const fn is_playing(&self) -> bool { self.ticker.is_some() }

    fn play(&mut self, interval: Duration) -> bool {
        if self.is_playing() {
            self.pause();
        }

        if self.queue.is_empty() {
            tracing::warn!("slideshow: cannot play an empty queue");
            return false;
        }

        let interval = interval.max(MIN_INTERVAL);
        let generation = self.bump_generation();
        let sender = self.sender.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(sender) = sender.upgrade() else {
                    break;
                };
                if sender.send(ServiceMessage::TimerTick { generation }).await.is_err() {
                    break;
                }
            }
        });

        self.ticker = Some(Scheduled { generation, task });
        tracing::info!(interval_secs = interval.as_secs(), "slideshow: playing");
        self.emit(SlideshowEvent::SlideshowStateChanged(true));
        true
    }

    fn pause(&mut self) {
        self.cancel_ticker();
        tracing::debug!("slideshow: paused");
        self.emit(SlideshowEvent::SlideshowStateChanged(false));
    }

    fn on_timer_tick(&mut self, generation: u64) {
        if self.ticker.as_ref().is_none_or(|ticker| ticker.generation != generation) {
            tracing::trace!(generation, "slideshow: ignoring stale tick");
            return;
        }

        tracing::debug!("slideshow: timer fired");
        self.next_wallpaper();
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    // ========================================================================
    // Debounced reload
    // ========================================================================

    /// Schedules a non-shuffling reload. Coalesces with a pending one.
    fn schedule_reload(&mut self) {
        if self.reload.is_some() {
            return;
        }

        let generation = self.bump_generation();
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(RELOAD_DEBOUNCE).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(ServiceMessage::ReloadDue { generation }).await;
            }
        });

        tracing::debug!("slideshow: reload scheduled");
        self.reload = Some(Scheduled { generation, task });
    }

    fn on_reload_due(&mut self, generation: u64) {
        if self.reload.as_ref().is_none_or(|reload| reload.generation != generation) {
            return;
        }

        self.reload = None;
        self.reload_folder(false);
    }

    fn cancel_reload(&mut self) {
        if let Some(reload) = self.reload.take() {
            reload.cancel();
        }
    }

    // ========================================================================
    // Queries and maintenance
    // ========================================================================

    fn status(&self) -> SlideshowStatus {
        SlideshowStatus {
            current_wallpaper: self.cache.current_wallpaper(),
            is_playing: self.is_playing(),
            queue_length: self.queue.len(),
            current_index: self.queue.index(),
            next_wallpaper_preview: self.queue.peek_next().cloned(),
            folder: self.folder.clone(),
        }
    }

    fn clear_cache(&mut self) -> bool {
        match self.cache.clear() {
            Ok(freed) => {
                tracing::info!(freed = %format_bytes(freed), "slideshow: cache cleared");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "slideshow: failed to clear cache");
                false
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn emit(&self, event: SlideshowEvent) {
        tracing::trace!(event = event.name(), "slideshow: emitting event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    const fn bump_generation(&mut self) -> u64 {
        self.next_generation = self.next_generation.wrapping_add(1);
        self.next_generation
    }

    fn reap_tasks(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_task_result(result);
        }
    }

    /// Cancels timers and the watcher, then waits for in-flight tasks.
    async fn shutdown(&mut self) {
        self.cancel_ticker();
        self.cancel_reload();
        self.monitor = None;

        if !self.tasks.is_empty() {
            tracing::debug!(tasks = self.tasks.len(), "slideshow: waiting for in-flight tasks");
        }
        while let Some(result) = self.tasks.join_next().await {
            log_task_result(result);
        }
    }
}

impl Drop for SlideshowService {
    fn drop(&mut self) {
        self.cancel_ticker();
        self.cancel_reload();
    }
}

fn log_task_result(result: Result<(), tokio::task::JoinError>) {
    match result {
        Err(err) if err.is_panic() => {
            tracing::error!(error = %err, "slideshow: background task panicked");
        }
        _ => {}
    }
}
