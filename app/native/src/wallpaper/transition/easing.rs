//! Easing curves applied to transition progress.
//!
//! Raw progress grows linearly with time. Frames are blended at the eased
//! progress instead, so transitions accelerate and decelerate.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Linear interpolation between two values.
#[inline]
#[must_use]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 { (end - start).mul_add(t, start) }

/// Linear easing (no acceleration).
#[inline]
#[must_use]
pub const fn ease_linear(t: f64) -> f64 { t }

/// Cubic ease-in (slow start, accelerates).
#[inline]
#[must_use]
pub fn ease_in(t: f64) -> f64 { t * t * t }

/// Cubic ease-out (fast start, decelerates).
#[inline]
#[must_use]
pub fn ease_out(t: f64) -> f64 {
    let t1 = t - 1.0;
    (t1 * t1).mul_add(t1, 1.0)
}

/// Symmetric cubic ease-in-out.
///
/// `4t³` below the midpoint, `1 - (-2t + 2)³ / 2` above it.
#[inline]
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let t1 = 2.0f64.mul_add(t, -2.0);
        (0.5 * t1 * t1).mul_add(t1, 1.0)
    }
}

/// Easing curve selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Accelerates from rest.
    EaseIn,
    /// Decelerates to rest.
    EaseOut,
    /// Accelerates, then decelerates.
    #[default]
    EaseInOut,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` onto this curve.
    #[inline]
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => ease_linear(t),
            Self::EaseIn => ease_in(t),
            Self::EaseOut => ease_out(t),
            Self::EaseInOut => ease_in_out(t),
        }
    }
}
