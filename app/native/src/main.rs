#![allow(clippy::multiple_crate_versions)]

//! Wallshow - wallpaper slideshow engine.
//!
//! This binary hosts the slideshow service (`wallshow run`) and the one-shot
//! cache, setter and transition commands.

use tracing_subscriber::EnvFilter;
use wallshow_lib::constants::DEFAULT_LOG_FILTER;

fn main() {
    init_logging();

    if let Err(err) = wallshow_lib::cli::run() {
        eprintln!("wallshow: {err}");
        std::process::exit(1);
    }
}

/// Initializes logging to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
