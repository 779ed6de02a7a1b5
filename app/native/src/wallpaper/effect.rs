//! Transition effect catalog.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Angle passed to the external setter for directional transitions.
pub const SWWW_TRANSITION_ANGLE: u32 = 45;

/// Frame rate requested from the external setter.
pub const SWWW_TRANSITION_FPS: u32 = 60;

/// Duration in seconds requested from the external setter.
pub const SWWW_TRANSITION_DURATION: u32 = 1;

/// A named transition between two wallpapers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    /// Linear cross-fade.
    #[default]
    Fade,
    /// Both images move left, the next one entering from the right.
    Slide,
    /// The current image grows by up to 20% while fading out.
    Zoom,
    /// Blocky dissolve.
    Pixelate,
    /// Swirl. Rendered locally as a fade.
    Swirl,
    /// Hard-edged reveal from left to right.
    Wipe,
}

impl TransitionEffect {
    /// Every known effect.
    pub const ALL: [Self; 6] =
        [Self::Fade, Self::Slide, Self::Zoom, Self::Pixelate, Self::Swirl, Self::Wipe];

    /// Parses an effect name case-insensitively. Unknown names map to `Fade`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "slide" => Self::Slide,
            "zoom" => Self::Zoom,
            "pixelate" => Self::Pixelate,
            "swirl" => Self::Swirl,
            "wipe" => Self::Wipe,
            _ => Self::Fade,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
            Self::Pixelate => "pixelate",
            Self::Swirl => "swirl",
            Self::Wipe => "wipe",
        }
    }

    /// Returns the `swww` `--transition-type` keyword for this effect.
    #[must_use]
    pub const fn swww_transition(self) -> &'static str {
        match self {
            Self::Fade | Self::Pixelate => "fade",
            Self::Slide => "left",
            Self::Zoom => "grow",
            Self::Swirl => "wave",
            Self::Wipe => "wipe",
        }
    }

    /// Returns whether the `swww` transition takes `--transition-angle`.
    #[must_use]
    pub const fn needs_angle(self) -> bool { matches!(self, Self::Swirl | Self::Wipe) }
}

impl std::fmt::Display for TransitionEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known_effects() {
        for effect in TransitionEffect::ALL {
            assert_eq!(TransitionEffect::from_name(effect.name()), effect);
        }
        assert_eq!(TransitionEffect::from_name("  ZOOM "), TransitionEffect::Zoom);
    }

    #[test]
    fn test_from_name_unknown_falls_back_to_fade() {
        assert_eq!(TransitionEffect::from_name("sparkle"), TransitionEffect::Fade);
        assert_eq!(TransitionEffect::from_name(""), TransitionEffect::Fade);
    }

    #[test]
    fn test_swww_mapping() {
        assert_eq!(TransitionEffect::Fade.swww_transition(), "fade");
        assert_eq!(TransitionEffect::Slide.swww_transition(), "left");
        assert_eq!(TransitionEffect::Zoom.swww_transition(), "grow");
        assert_eq!(TransitionEffect::Pixelate.swww_transition(), "fade");
        assert_eq!(TransitionEffect::Swirl.swww_transition(), "wave");
        assert_eq!(TransitionEffect::Wipe.swww_transition(), "wipe");
    }

    #[test]
    fn test_angle_only_for_wipe_and_wave() {
        let with_angle: Vec<_> =
            TransitionEffect::ALL.into_iter().filter(|e| e.needs_angle()).collect();
        assert_eq!(with_angle, vec![TransitionEffect::Swirl, TransitionEffect::Wipe]);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TransitionEffect::Pixelate).unwrap();
        assert_eq!(json, "\"pixelate\"");
    }
}
