//! Colour regeneration hook.
//!
//! After a wallpaper change the shell may regenerate its colour scheme from
//! the new image. The service fires the hook and never waits on it.

use std::path::Path;
use std::process::Stdio;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::process::Command;

use crate::config::ColorsConfig;

/// Errors that can occur while regenerating colours.
#[derive(Debug, Error)]
pub enum ColorError {
    /// The command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The command exited unsuccessfully.
    #[error("`{command}` exited with {status}")]
    ExitStatus {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Regenerates the colour scheme from a wallpaper.
pub trait ColorRegenerator: Send + Sync {
    /// Regenerates colours from `path`.
    fn regenerate(&self, path: &Path) -> BoxFuture<'static, Result<(), ColorError>>;
}

/// Runs a configured command with the wallpaper path appended.
#[derive(Debug, Clone)]
pub struct CommandColorRegenerator {
    program: String,
    args: Vec<String>,
}

impl CommandColorRegenerator {
    /// Creates a regenerator from the configuration, or `None` when disabled.
    #[must_use]
    pub fn from_config(config: &ColorsConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }

        let (program, args) = config.command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ColorRegenerator for CommandColorRegenerator {
    fn regenerate(&self, path: &Path) -> BoxFuture<'static, Result<(), ColorError>> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let program = self.program.clone();

        Box::pin(async move {
            let status = command
                .status()
                .await
                .map_err(|source| ColorError::Spawn { command: program.clone(), source })?;

            if status.success() {
                Ok(())
            } else {
                Err(ColorError::ExitStatus { command: program, status })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_has_no_regenerator() {
        assert!(CommandColorRegenerator::from_config(&ColorsConfig::default()).is_none());
    }

    #[test]
    fn test_command_is_split_into_program_and_args() {
        let config = ColorsConfig {
            command: vec!["matugen".to_string(), "image".to_string()],
        };
        let regenerator = CommandColorRegenerator::from_config(&config).unwrap();
        assert_eq!(regenerator.program, "matugen");
        assert_eq!(regenerator.args, vec!["image"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let config = ColorsConfig {
            command: vec!["wallshow-no-such-colors".to_string()],
        };
        let regenerator = CommandColorRegenerator::from_config(&config).unwrap();
        let result = regenerator.regenerate(Path::new("/walls/a.png")).await;
        assert!(matches!(result, Err(ColorError::Spawn { .. })));
    }
}
