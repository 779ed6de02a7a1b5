//! Platform helpers for Wallshow.
//!
//! - [`path`] - Path expansion and cache directory resolution

pub mod path;

pub use path::{absolutize, cache_dir, cache_subdir, expand, expand_and_resolve};
