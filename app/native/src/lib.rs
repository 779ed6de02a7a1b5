//! Wallshow - a wallpaper slideshow engine for desktop shells.
//!
//! This library provides the slideshow service, the wallpaper cache, the
//! transition renderer and the CLI built on top of them.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod platform;
pub mod wallpaper;
