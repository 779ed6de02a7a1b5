//! Timed transitions rendered on the CPU.
//!
//! [`TransitionRenderer`] animates one transition at a time: it loads both
//! images up front, then a ticker task advances progress every
//! [`FRAME_INTERVAL`] and renders a frame at the eased progress. The
//! production path hands transitions to the external setter instead; this
//! renderer backs previews and the `transition` command.

pub mod easing;
pub mod frame;

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub use easing::Easing;
pub use frame::{
    TransitionError, compose_frame, create_transition_image, load_pair, render_transition_frame,
    save_frame,
};
use image::DynamicImage;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::TransitionEffect;

/// Time between two ticks (about 60 per second).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Slack absorbing float error when accumulating progress.
const PROGRESS_EPSILON: f64 = 1e-9;

/// Callback fired once when a transition completes.
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The transition is still running at the given raw progress.
    Running(f64),
    /// The transition reached the end and stopped.
    Completed,
}

struct ActiveTransition {
    current: Arc<DynamicImage>,
    next: Arc<DynamicImage>,
    duration_secs: f64,
    on_complete: Option<CompletionCallback>,
}

#[derive(Default)]
struct RendererState {
    active: Option<ActiveTransition>,
    effect: TransitionEffect,
    progress: f64,
    last_frame: Option<DynamicImage>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped on every start and stop so frames composed for an older
    /// transition are dropped.
    epoch: u64,
}

/// A frame to compose outside the state lock.
struct FrameJob {
    current: Arc<DynamicImage>,
    next: Arc<DynamicImage>,
    eased: f64,
    effect: TransitionEffect,
    epoch: u64,
}

impl FrameJob {
    fn compose(&self) -> DynamicImage { compose_frame(&self.current, &self.next, self.eased, self.effect) }
}

/// Animates a transition between two images.
///
/// Only one transition runs at a time. Starting another one stops the
/// current transition first without firing its callback.
pub struct TransitionRenderer {
    state: Arc<Mutex<RendererState>>,
    easing: Easing,
}

impl Default for TransitionRenderer {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for TransitionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionRenderer")
            .field("running", &self.is_running())
            .field("progress", &self.progress())
            .field("easing", &self.easing)
            .finish()
    }
}

impl TransitionRenderer {
    /// Creates an idle renderer using the cubic ease-in-out curve.
    #[must_use]
    pub fn new() -> Self { Self::with_easing(Easing::EaseInOut) }

    /// Creates an idle renderer using `easing`.
    #[must_use]
    pub fn with_easing(easing: Easing) -> Self {
        Self {
            state: Arc::new(Mutex::new(RendererState::default())),
            easing,
        }
    }

    /// Starts a transition from `current` to `next`.
    ///
    /// Both images are decoded before anything else happens. Returns `false`
    /// and leaves the renderer untouched if either cannot be loaded or if no
    /// tokio runtime is available to drive the ticker.
    pub fn start_transition(
        &self,
        current: &Path,
        next: &Path,
        effect: TransitionEffect,
        duration: Duration,
        on_complete: Option<CompletionCallback>,
    ) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("transition requires a tokio runtime");
            return false;
        };

        let (current_image, next_image) = match load_pair(current, next) {
            Ok(images) => images,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load images for transition");
                return false;
            }
        };

        self.stop_transition();

        let mut state = self.state.lock();
        state.active = Some(ActiveTransition {
            current: Arc::new(current_image),
            next: Arc::new(next_image),
            duration_secs: duration.as_secs_f64().max(FRAME_INTERVAL.as_secs_f64()),
            on_complete,
        });
        state.effect = effect;
        state.progress = 0.0;
        state.last_frame = None;
        state.epoch = state.epoch.wrapping_add(1);
        state.ticker = Some(runtime.spawn(run_ticker(Arc::downgrade(&self.state), self.easing)));

        tracing::debug!(
            effect = %effect,
            duration_ms = duration.as_millis(),
            "transition started"
        );
        true
    }

    /// Stops the running transition, if any.
    ///
    /// Cancels the ticker, releases both images and resets progress to zero.
    /// The completion callback is not fired.
    pub fn stop_transition(&self) {
        let mut state = self.state.lock();
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        state.active = None;
        state.progress = 0.0;
        state.epoch = state.epoch.wrapping_add(1);
    }

    /// Advances the transition by one frame.
    ///
    /// Returns `None` when no transition is running.
    pub fn step(&self) -> Option<TickOutcome> {
        let job = begin_frame(&self.state, self.easing)?;
        let frame = job.compose();
        finish_frame(&self.state, &job, frame)
    }

    /// Returns whether a transition is running.
    #[must_use]
    pub fn is_running(&self) -> bool { self.state.lock().active.is_some() }

    /// Returns the raw (un-eased) progress in `[0, 1]`.
    ///
    /// Stays at `1.0` after a transition completes until the next start or stop.
    #[must_use]
    pub fn progress(&self) -> f64 { self.state.lock().progress }

    /// Returns the effect of the current or most recent transition.
    #[must_use]
    pub fn effect(&self) -> TransitionEffect { self.state.lock().effect }

    /// Returns the most recently rendered frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<DynamicImage> { self.state.lock().last_frame.clone() }
}

impl Drop for TransitionRenderer {
    fn drop(&mut self) {
        if let Some(ticker) = self.state.lock().ticker.take() {
            ticker.abort();
        }
    }
}

/// Drives the transition. Frames are composed on the blocking pool so the
/// runtime thread never holds up other tasks.
async fn run_ticker(state: Weak<Mutex<RendererState>>, easing: Easing) {
    let mut interval = interval_at(Instant::now() + FRAME_INTERVAL, FRAME_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(job) = state.upgrade().and_then(|state| begin_frame(&state, easing)) else {
            break;
        };

        let job = Arc::new(job);
        let composed = tokio::task::spawn_blocking({
            let job = Arc::clone(&job);
            move || job.compose()
        })
        .await;

        let Ok(frame) = composed else {
            tracing::warn!("transition frame composition failed");
            break;
        };
        let Some(state) = state.upgrade() else {
            break;
        };
        if !matches!(finish_frame(&state, &job, frame), Some(TickOutcome::Running(_))) {
            break;
        }
    }
}

/// Advances progress and snapshots what the next frame needs.
fn begin_frame(state: &Mutex<RendererState>, easing: Easing) -> Option<FrameJob> {
    let mut guard = state.lock();
    let state = &mut *guard;
    let active = state.active.as_ref()?;

    let progress = state.progress + FRAME_INTERVAL.as_secs_f64() / active.duration_secs;
    state.progress = if progress + PROGRESS_EPSILON >= 1.0 { 1.0 } else { progress };

    Some(FrameJob {
        current: Arc::clone(&active.current),
        next: Arc::clone(&active.next),
        eased: easing.apply(state.progress),
        effect: state.effect,
        epoch: state.epoch,
    })
}

/// Stores a composed frame and completes the transition at full progress.
fn finish_frame(state: &Mutex<RendererState>, job: &FrameJob, frame: DynamicImage) -> Option<TickOutcome> {
    let mut guard = state.lock();
    if guard.epoch != job.epoch || guard.active.is_none() {
        return None;
    }

    guard.last_frame = Some(frame);
    if guard.progress < 1.0 {
        return Some(TickOutcome::Running(guard.progress));
    }

    let on_complete = guard.active.take().and_then(|mut active| active.on_complete.take());
    // The ticker ends on its own after this tick.
    guard.ticker = None;
    drop(guard);

    tracing::debug!("transition completed");
    if let Some(callback) = on_complete {
        callback();
    }
    Some(TickOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    use super::*;

    fn fixtures() -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])).save(&first).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])).save(&second).unwrap();
        (dir, first, second)
    }

    fn counter_callback(counter: &Arc<AtomicUsize>) -> Option<CompletionCallback> {
        let counter = Arc::clone(counter);
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_completes_once_within_duration_plus_one_tick() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        let completions = Arc::new(AtomicUsize::new(0));

        assert!(renderer.start_transition(
            &first,
            &second,
            TransitionEffect::Fade,
            Duration::from_secs(1),
            counter_callback(&completions),
        ));
        assert!(renderer.is_running());

        tokio::time::sleep(Duration::from_secs(1) + FRAME_INTERVAL).await;

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!renderer.is_running());
        assert!((renderer.progress() - 1.0).abs() < f64::EPSILON);

        let frame = renderer.last_frame().unwrap().to_rgb8();
        assert_eq!(frame.get_pixel(0, 0).0, [255, 255, 255]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(renderer.step().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_runs_midway() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        renderer.start_transition(&first, &second, TransitionEffect::Fade, Duration::from_secs(1), None);

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(renderer.is_running());
        let progress = renderer.progress();
        assert!(progress > 0.4 && progress < 0.6, "unexpected progress {progress}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_for_stopped_transition_is_dropped() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::with_easing(Easing::Linear);
        let completions = Arc::new(AtomicUsize::new(0));
        renderer.start_transition(
            &first,
            &second,
            TransitionEffect::Fade,
            Duration::from_millis(16),
            counter_callback(&completions),
        );

        let job = begin_frame(&renderer.state, Easing::Linear).unwrap();
        // Composition happens without the state lock held.
        assert!(renderer.is_running());
        assert!((renderer.progress() - 1.0).abs() < f64::EPSILON);
        let frame = job.compose();

        renderer.stop_transition();

        assert!(finish_frame(&renderer.state, &job, frame).is_none());
        assert!(renderer.last_frame().is_none());
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_manual_steps_reach_completion() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::with_easing(Easing::Linear);
        let completions = Arc::new(AtomicUsize::new(0));
        renderer.start_transition(
            &first,
            &second,
            TransitionEffect::Wipe,
            Duration::from_millis(160),
            counter_callback(&completions),
        );

        let mut ticks = 0;
        while let Some(outcome) = renderer.step() {
            ticks += 1;
            if outcome == TickOutcome::Completed {
                break;
            }
        }

        assert_eq!(ticks, 10);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.effect(), TransitionEffect::Wipe);
        renderer.stop_transition();
    }

    #[tokio::test]
    async fn test_start_fails_without_state_change_on_bad_image() {
        let (dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        renderer.start_transition(&first, &second, TransitionEffect::Zoom, Duration::from_secs(1), None);
        renderer.step();
        let progress = renderer.progress();

        let missing = dir.path().join("missing.png");
        assert!(!renderer.start_transition(&first, &missing, TransitionEffect::Fade, Duration::from_secs(1), None));

        assert!(renderer.is_running());
        assert_eq!(renderer.effect(), TransitionEffect::Zoom);
        assert!((renderer.progress() - progress).abs() < f64::EPSILON);
        renderer.stop_transition();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_stops_previous_transition() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        let first_done = Arc::new(AtomicUsize::new(0));
        let second_done = Arc::new(AtomicUsize::new(0));

        renderer.start_transition(
            &first,
            &second,
            TransitionEffect::Fade,
            Duration::from_secs(1),
            counter_callback(&first_done),
        );
        tokio::time::sleep(Duration::from_millis(300)).await;

        renderer.start_transition(
            &second,
            &first,
            TransitionEffect::Slide,
            Duration::from_secs(1),
            counter_callback(&second_done),
        );
        assert!(renderer.progress() < f64::EPSILON);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(first_done.load(Ordering::SeqCst), 0);
        assert_eq!(second_done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_cancels_callback() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        let completions = Arc::new(AtomicUsize::new(0));

        renderer.stop_transition();
        renderer.start_transition(
            &first,
            &second,
            TransitionEffect::Fade,
            Duration::from_secs(1),
            counter_callback(&completions),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        renderer.stop_transition();
        renderer.stop_transition();
        assert!(!renderer.is_running());
        assert!(renderer.progress() < f64::EPSILON);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let (_dir, first, second) = fixtures();
        let renderer = TransitionRenderer::new();
        assert!(!renderer.start_transition(&first, &second, TransitionEffect::Fade, Duration::from_secs(1), None));
        assert!(!renderer.is_running());
    }
}
