//! Base command execution abstraction
//!
//! Provides the foundational trait for executing external commands, enabling
//! dependency injection for testing.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }

    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("IO error: {message}")]
    Io { message: String },
}

/// Trait for executing external commands
///
/// This abstraction allows the rest of the codebase to execute commands
/// without directly depending on std::process::Command, enabling testing
/// with mock implementations.
pub trait CommandExecutor {
    /// Run to completion and capture output.
    fn execute(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError>;

    /// Start without waiting for the process to finish.
    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CommandError>;
}

/// Real implementation using std::process::Command
#[derive(Debug, Clone, Default)]
pub struct ProcessCommandExecutor {
    working_dir: Option<PathBuf>,
}

impl ProcessCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(working_dir.into()),
        }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

fn map_spawn_error(program: &str, error: std::io::Error) -> CommandError {
    if error.kind() == std::io::ErrorKind::NotFound {
        CommandError::CommandNotFound {
            command: program.to_string(),
        }
    } else {
        CommandError::Io {
            message: error.to_string(),
        }
    }
}

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError> {
        tracing::debug!(program, args = ?args, "Running command");

        let output = self
            .command(program, args)
            .envs(env.iter().copied())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| map_spawn_error(program, e))?;

        let result = CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        tracing::debug!(status = result.status_code, output = %result.combined(), "Command finished");
        Ok(result)
    }

    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CommandError> {
        tracing::debug!(program, args = ?args, "Starting command");

        self.command(program, args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| map_spawn_error(program, e))?;
        Ok(())
    }
}
