//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};

use crate::config::{self, LoadedConfig};
use crate::error::WallshowError;
use crate::wallpaper::cache::format_bytes;
use crate::wallpaper::scan::list_images_in_directory;
use crate::wallpaper::transition::{Easing, TransitionRenderer, create_transition_image, save_frame};
use crate::wallpaper::{self, SlideshowHandle, TransitionEffect, WallpaperCache};

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long shutdown waits for in-flight setter and colour tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// Wallshow - Wallpaper slideshow engine.
#[derive(Parser, Debug)]
#[command(name = "wallshow")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a configuration file (JSON or JSONC).
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the slideshow service.
    ///
    /// Applies the startup configuration (folder or single image, optional
    /// automatic rotation) and keeps running until interrupted with Ctrl-C.
    Run,

    /// Set the desktop wallpaper.
    ///
    /// Applies a single image through the external setter, records it in the
    /// history and regenerates colours when configured.
    #[command(after_long_help = r#"Examples:
  wallshow set ~/Pictures/forest.jpg               # Set wallpaper and regenerate colours
  wallshow set ~/Pictures/forest.jpg --no-colors   # Set wallpaper only"#)]
    Set {
        /// The path to the image to use as wallpaper.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Skip colour regeneration.
        #[arg(long)]
        no_colors: bool,
    },

    /// List the wallpapers in a folder.
    ///
    /// Returns a JSON array of absolute image paths in queue order.
    List {
        /// The folder to scan. Defaults to the configured folder.
        #[arg(value_name = "FOLDER")]
        folder: Option<PathBuf>,
    },

    /// Print the wallpaper history, most recent first.
    History,

    /// Print the current wallpaper.
    Current,

    /// Print the cached metadata of an image as JSON.
    Metadata {
        /// The image to inspect.
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Generate the thumbnail of an image and print its path.
    Thumbnail {
        /// The image to generate a thumbnail for.
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Pre-generate thumbnails for every image in a folder.
    ///
    /// Thumbnails are generated in parallel. Existing up-to-date thumbnails
    /// are reused.
    Thumbnails {
        /// The folder to scan. Defaults to the configured folder.
        #[arg(value_name = "FOLDER")]
        folder: Option<PathBuf>,
    },

    /// Clear the wallpaper cache.
    ///
    /// Removes thumbnails, metadata, history and the current-wallpaper pointer.
    #[command(name = "clear-cache")]
    ClearCache,

    /// Render a single transition frame.
    #[command(after_long_help = r#"Examples:
  wallshow preview a.jpg b.jpg --output mid.jpg                      # Halfway cross-fade
  wallshow preview a.jpg b.jpg --output wipe.png -p 0.25 -e wipe     # Quarter-way wipe"#)]
    Preview {
        /// The image transitioned from.
        #[arg(value_name = "FROM")]
        from: PathBuf,

        /// The image transitioned to.
        #[arg(value_name = "TO")]
        to: PathBuf,

        /// Where to save the frame.
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,

        /// Progress between 0.0 and 1.0.
        #[arg(long, short, default_value_t = 0.5)]
        progress: f64,

        /// Transition effect. Defaults to the configured effect.
        #[arg(long, short, value_enum)]
        effect: Option<TransitionEffect>,
    },

    /// Run a timed transition and save its final frame.
    Transition {
        /// The image transitioned from.
        #[arg(value_name = "FROM")]
        from: PathBuf,

        /// The image transitioned to.
        #[arg(value_name = "TO")]
        to: PathBuf,

        /// Where to save the final frame.
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,

        /// Transition effect. Defaults to the configured effect.
        #[arg(long, short, value_enum)]
        effect: Option<TransitionEffect>,

        /// Duration in seconds. Defaults to the configured duration.
        #[arg(long, short)]
        duration: Option<f64>,

        /// Easing curve applied to progress.
        #[arg(long, value_enum, default_value_t = Easing::EaseInOut)]
        easing: Easing,
    },

    /// Output Wallshow configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// Wallshow configuration file. Can be redirected to a file for use with
    /// editors that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    /// Can be used with eval or redirected to a file.
    ///
    /// Usage:
    ///   eval "$(wallshow completions --shell zsh)"
    ///   wallshow completions --shell bash > ~/.local/share/bash-completion/completions/wallshow
    ///   wallshow completions --shell fish > ~/.config/fish/completions/wallshow.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), WallshowError> {
        match &self.command {
            Commands::Schema => println!("{}", config::generate_schema()),
            Commands::Completions { shell } => Self::print_completions(*shell),
            command => {
                let loaded = config::load(self.config.as_deref())?;
                Self::execute_with_config(command, &loaded)?;
            }
        }

        Ok(())
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "wallshow", &mut io::stdout());
    }

    /// Execute commands that need the configuration.
    fn execute_with_config(command: &Commands, loaded: &LoadedConfig) -> Result<(), WallshowError> {
        match command {
            Commands::Run => block_on(execute_run(loaded)),
            Commands::Set { path, no_colors } => block_on(execute_set(loaded, path, !*no_colors)),
            Commands::List { folder } => {
                let folder = resolve_folder(loaded, folder.as_deref())?;
                let images = list_images_in_directory(&folder)?;
                print_json(&images)
            }
            Commands::History => print_json(&open_cache(loaded)?.history()),
            Commands::Current => {
                match open_cache(loaded)?.current_wallpaper() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No current wallpaper."),
                }
                Ok(())
            }
            Commands::Metadata { path } => {
                ensure_file(path)?;
                let metadata = open_cache(loaded)?.metadata(path)?;
                print_json(&metadata)
            }
            Commands::Thumbnail { path } => {
                ensure_file(path)?;
                let thumbnail = open_cache(loaded)?.generate_thumbnail(path)?;
                println!("{}", thumbnail.display());
                Ok(())
            }
            Commands::Thumbnails { folder } => execute_thumbnails(loaded, folder.as_deref()),
            Commands::ClearCache => {
                let freed = open_cache(loaded)?.clear()?;
                println!("Cache cleared successfully. Freed {}.", format_bytes(freed));
                Ok(())
            }
            Commands::Preview { from, to, output, progress, effect } => {
                let effect = effect.unwrap_or_else(|| loaded.config.slideshow.effect());
                create_transition_image(from, to, *progress, output, effect)?;
                println!("{}", output.display());
                Ok(())
            }
            Commands::Transition { from, to, output, effect, duration, easing } => {
                let effect = effect.unwrap_or_else(|| loaded.config.slideshow.effect());
                let duration = duration
                    .filter(|secs| secs.is_finite() && *secs > 0.0)
                    .map_or_else(|| loaded.config.slideshow.transition_duration(), Duration::from_secs_f64);
                block_on(execute_transition(from, to, output, effect, duration, *easing))
            }
            Commands::Schema | Commands::Completions { .. } => Ok(()),
        }
    }
}

/// Runs a future on a fresh current-thread runtime.
fn block_on<F>(future: F) -> Result<(), WallshowError>
where
    F: Future<Output = Result<(), WallshowError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(future)
}

fn open_cache(loaded: &LoadedConfig) -> Result<WallpaperCache, WallshowError> {
    let dir = loaded.config.cache.resolve_dir(&loaded.base_dir());
    Ok(WallpaperCache::open(dir)?)
}

fn ensure_file(path: &Path) -> Result<(), WallshowError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(WallshowError::InvalidArguments(format!("File not found: {}", path.display())))
    }
}

/// Returns `folder`, or the configured folder when none is given.
fn resolve_folder(loaded: &LoadedConfig, folder: Option<&Path>) -> Result<PathBuf, WallshowError> {
    folder
        .map(Path::to_path_buf)
        .or_else(|| loaded.config.slideshow.folder(&loaded.base_dir()))
        .ok_or_else(|| WallshowError::InvalidArguments("No folder given or configured.".to_string()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), WallshowError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Starts the service and runs until Ctrl-C.
async fn execute_run(loaded: &LoadedConfig) -> Result<(), WallshowError> {
    let (handle, _options) = wallpaper::spawn_from_config(loaded)?;
    let mut events = handle.subscribe();

    if !wallpaper::apply_startup(&handle, &loaded.config.slideshow, &loaded.base_dir()).await? {
        tracing::info!("nothing configured to show at startup");
    }

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("interrupted, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => tracing::debug!(event = event.name(), "slideshow event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    shutdown(&handle).await
}

/// Applies one wallpaper and waits for the setter to finish.
async fn execute_set(loaded: &LoadedConfig, path: &Path, update_colors: bool) -> Result<(), WallshowError> {
    let (handle, _options) = wallpaper::spawn_from_config(loaded)?;

    let applied = handle.set_wallpaper(path, update_colors).await?;
    shutdown(&handle).await?;

    if !applied {
        return Err(WallshowError::WallpaperError(format!("Wallpaper not found: {}", path.display())));
    }

    println!("Wallpaper set successfully.");
    Ok(())
}

async fn shutdown(handle: &SlideshowHandle) -> Result<(), WallshowError> {
    handle.shutdown(SHUTDOWN_TIMEOUT).await?;
    Ok(())
}

/// Generates thumbnails for a folder in parallel.
fn execute_thumbnails(loaded: &LoadedConfig, folder: Option<&Path>) -> Result<(), WallshowError> {
    let folder = resolve_folder(loaded, folder)?;
    let images = list_images_in_directory(&folder)?;
    let cache = open_cache(loaded)?;

    let failed = images
        .par_iter()
        .filter(|image| match cache.generate_thumbnail(image) {
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(error = %err, path = %image.display(), "failed to generate thumbnail");
                true
            }
        })
        .count();

    println!("Generated {} thumbnails ({failed} failed).", images.len() - failed);
    Ok(())
}

/// Runs the timed renderer to completion and saves its last frame.
async fn execute_transition(
    from: &Path,
    to: &Path,
    output: &Path,
    effect: TransitionEffect,
    duration: Duration,
    easing: Easing,
) -> Result<(), WallshowError> {
    let renderer = TransitionRenderer::with_easing(easing);
    let (done_tx, done_rx) = oneshot::channel();

    let started = renderer.start_transition(
        from,
        to,
        effect,
        duration,
        Some(Box::new(move || {
            let _ = done_tx.send(());
        })),
    );

    if !started {
        return Err(WallshowError::TransitionError(format!(
            "Could not load {} and {}",
            from.display(),
            to.display()
        )));
    }

    done_rx
        .await
        .map_err(|_| WallshowError::TransitionError("Transition stopped early".to_string()))?;

    let frame = renderer
        .last_frame()
        .ok_or_else(|| WallshowError::TransitionError("No frame rendered".to_string()))?;
    save_frame(&frame, output)?;

    println!("{}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_set_with_flags() {
        let cli = Cli::try_parse_from(["wallshow", "set", "/walls/a.png", "--no-colors"]).unwrap();
        match cli.command {
            Commands::Set { path, no_colors } => {
                assert_eq!(path, PathBuf::from("/walls/a.png"));
                assert!(no_colors);
            }
            _ => panic!("Expected Set command"),
        }
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["wallshow", "history", "--config", "/tmp/w.jsonc"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.jsonc")));
        assert!(matches!(cli.command, Commands::History));
    }

    #[test]
    fn test_cli_parses_preview_defaults() {
        let cli = Cli::try_parse_from(["wallshow", "preview", "a.png", "b.png", "-o", "out.png"]).unwrap();
        match cli.command {
            Commands::Preview { progress, effect, output, .. } => {
                assert!((progress - 0.5).abs() < f64::EPSILON);
                assert!(effect.is_none());
                assert_eq!(output, PathBuf::from("out.png"));
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_cli_parses_transition_options() {
        let cli = Cli::try_parse_from([
            "wallshow",
            "transition",
            "a.png",
            "b.png",
            "--output",
            "out.jpg",
            "--effect",
            "wipe",
            "--duration",
            "0.5",
            "--easing",
            "linear",
        ])
        .unwrap();
        match cli.command {
            Commands::Transition { effect, duration, easing, .. } => {
                assert_eq!(effect, Some(TransitionEffect::Wipe));
                assert_eq!(duration, Some(0.5));
                assert_eq!(easing, Easing::Linear);
            }
            _ => panic!("Expected Transition command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_effect() {
        let result = Cli::try_parse_from(["wallshow", "preview", "a", "b", "-o", "c", "-e", "melt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_clear_cache_name() {
        let cli = Cli::try_parse_from(["wallshow", "clear-cache"]).unwrap();
        assert!(matches!(cli.command, Commands::ClearCache));
    }

    #[test]
    fn test_cli_definition_is_valid() { Cli::command().debug_assert(); }

    #[test]
    fn test_resolve_folder_prefers_argument() {
        let loaded = LoadedConfig::default();
        let folder = resolve_folder(&loaded, Some(Path::new("/walls"))).unwrap();
        assert_eq!(folder, PathBuf::from("/walls"));
    }

    #[test]
    fn test_resolve_folder_without_any_folder_fails() {
        let mut loaded = LoadedConfig::default();
        loaded.config.slideshow.folder_path = String::new();
        assert!(matches!(resolve_folder(&loaded, None), Err(WallshowError::InvalidArguments(_))));
    }

    #[test]
    fn test_ensure_file_rejects_missing_path() {
        assert!(ensure_file(Path::new("/nonexistent/wallshow.png")).is_err());
    }
}
