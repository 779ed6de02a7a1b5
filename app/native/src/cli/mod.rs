//! CLI module for Wallshow.
//!
//! This module provides the command-line interface. `wallshow run` hosts the
//! slideshow service; the other commands are one-shot operations on the
//! cache, the external setter or the transition renderer.

mod commands;

use clap::Parser;
pub use commands::Cli;

use crate::error::WallshowError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), WallshowError> {
    let cli = Cli::parse();
    cli.execute()
}
