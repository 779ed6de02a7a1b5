//! External wallpaper setter.
//!
//! Applying a wallpaper and animating the on-screen transition is delegated
//! to an external process (`swww` by default). The service only needs to know
//! whether the process finished successfully.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::process::Command;

use super::effect::{
    SWWW_TRANSITION_ANGLE, SWWW_TRANSITION_DURATION, SWWW_TRANSITION_FPS, TransitionEffect,
};
use crate::config::SetterConfig;

/// Errors that can occur while running the external setter.
#[derive(Debug, Error)]
pub enum SetterError {
    /// The setter process could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The setter exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    ExitStatus {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    /// The setter did not finish in time.
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Applies a wallpaper on screen.
///
/// The returned future is independent of `self` so the caller can spawn it.
pub trait WallpaperSetter: Send + Sync {
    /// Applies `path` using the given transition.
    fn apply(&self, path: &Path, effect: TransitionEffect) -> BoxFuture<'static, Result<(), SetterError>>;
}

/// Builds the `swww img` argument list.
#[must_use]
pub fn swww_args(path: &Path, effect: TransitionEffect) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "img".into(),
        path.as_os_str().to_owned(),
        "--transition-type".into(),
        effect.swww_transition().into(),
        "--transition-duration".into(),
        SWWW_TRANSITION_DURATION.to_string().into(),
        "--transition-fps".into(),
        SWWW_TRANSITION_FPS.to_string().into(),
    ];

    if effect.needs_angle() {
        args.push("--transition-angle".into());
        args.push(SWWW_TRANSITION_ANGLE.to_string().into());
    }

    args
}

/// Runs `swww img` through `tokio::process`.
#[derive(Debug, Clone)]
pub struct SwwwSetter {
    command: String,
    timeout: Duration,
}

impl SwwwSetter {
    /// Creates a setter running `command` with the given timeout.
    #[must_use]
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self { command: command.into(), timeout }
    }

    /// Creates a setter from the configuration.
    #[must_use]
    pub fn from_config(config: &SetterConfig) -> Self { Self::new(config.command.clone(), config.timeout()) }
}

impl WallpaperSetter for SwwwSetter {
    fn apply(&self, path: &Path, effect: TransitionEffect) -> BoxFuture<'static, Result<(), SetterError>> {
        let command = self.command.clone();
        let timeout = self.timeout;
        let args = swww_args(path, effect);

        Box::pin(async move {
            let child = Command::new(&command)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(timeout, child)
                .await
                .map_err(|_| SetterError::Timeout { command: command.clone(), timeout })?
                .map_err(|source| SetterError::Spawn { command: command.clone(), source })?;

            if output.status.success() {
                Ok(())
            } else {
                Err(SetterError::ExitStatus {
                    command,
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(path: &str, effect: TransitionEffect) -> Vec<String> {
        swww_args(Path::new(path), effect)
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_swww_args_fade() {
        assert_eq!(
            args_as_strings("/walls/a.png", TransitionEffect::Fade),
            vec![
                "img",
                "/walls/a.png",
                "--transition-type",
                "fade",
                "--transition-duration",
                "1",
                "--transition-fps",
                "60",
            ]
        );
    }

    #[test]
    fn test_swww_args_wipe_has_angle() {
        let args = args_as_strings("/walls/a.png", TransitionEffect::Wipe);
        assert_eq!(&args[args.len() - 2..], ["--transition-angle", "45"]);
    }

    #[test]
    fn test_swww_args_swirl_maps_to_wave_with_angle() {
        let args = args_as_strings("/walls/a.png", TransitionEffect::Swirl);
        assert!(args.windows(2).any(|pair| pair == ["--transition-type", "wave"]));
        assert!(args.contains(&"--transition-angle".to_string()));
    }

    #[test]
    fn test_swww_args_slide_has_no_angle() {
        let args = args_as_strings("/walls/a.png", TransitionEffect::Slide);
        assert!(args.windows(2).any(|pair| pair == ["--transition-type", "left"]));
        assert!(!args.contains(&"--transition-angle".to_string()));
    }

    #[tokio::test]
    async fn test_missing_command_is_spawn_error() {
        let setter = SwwwSetter::new("wallshow-no-such-setter", Duration::from_secs(1));
        let result = setter.apply(Path::new("/walls/a.png"), TransitionEffect::Fade).await;
        assert!(matches!(result, Err(SetterError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_exit_status_error() {
        let setter = SwwwSetter::new("false", Duration::from_secs(5));
        let result = setter.apply(Path::new("/walls/a.png"), TransitionEffect::Fade).await;
        assert!(matches!(result, Err(SetterError::ExitStatus { .. })));
    }
}
