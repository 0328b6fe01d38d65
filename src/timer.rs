//! Local session timer and voice/notification commands
//!
//! The lifecycle only sees the [`SessionNotifier`] trait; [`LocalTimer`]
//! implements it by handing `sleep; voice; notify` to a detached shell.

use chrono::{Duration, Local};
use std::sync::Arc;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::config::MobConfig;
use crate::external::{CommandError, CommandExecutor};
use crate::output::Say;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("Too many placeholders ({count}) in format command string: {command}")]
    TooManyPlaceholders { count: usize, command: String },
    #[error("Cannot execute background commands on your os: {os}")]
    UnsupportedPlatform { os: String },
    #[error("timer couldn't be started on your system ({os}): {source}")]
    Command {
        os: String,
        #[source]
        source: CommandError,
    },
}

/// Notification collaborator invoked after a session starts or a break begins
#[cfg_attr(test, automock)]
pub trait SessionNotifier {
    fn start_timer(&self, minutes: u32) -> Result<(), TimerError>;

    fn start_break_timer(&self, minutes: u32) -> Result<(), TimerError>;

    fn moo(&self) -> Result<(), TimerError>;
}

/// Parse user input like `"10"`; anything unparsable or negative is zero.
pub fn to_minutes(input: &str) -> u32 {
    input
        .trim()
        .parse::<i64>()
        .map(|minutes| minutes.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

pub fn current_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Place `message` into `command` at `%s`, or append it.
pub fn inject_command_with_message(command: &str, message: &str) -> Result<String, TimerError> {
    let count = command.matches("%s").count();
    match count {
        0 => Ok(format!("{command} {message}")),
        1 => Ok(command.replacen("%s", message, 1)),
        _ => Err(TimerError::TooManyPlaceholders {
            count,
            command: command.to_string(),
        }),
    }
}

fn optional_command(command: &str, message: &str) -> Result<Option<String>, TimerError> {
    if command.is_empty() {
        return Ok(None);
    }
    inject_command_with_message(command, message).map(Some)
}

pub struct LocalTimer {
    executor: Arc<dyn CommandExecutor>,
    config: MobConfig,
    say: Say,
}

impl LocalTimer {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: MobConfig, say: Say) -> Self {
        Self {
            executor,
            config,
            say,
        }
    }

    fn run_in_background(&self, commands: &[String]) -> Result<(), TimerError> {
        let commands: Vec<&str> = commands
            .iter()
            .map(String::as_str)
            .filter(|command| !command.is_empty())
            .collect();
        let os = std::env::consts::OS.to_string();
        tracing::debug!(os = %os, commands = ?commands, "Executing commands in background");

        let result = match std::env::consts::OS {
            "windows" => {
                let script = format!(
                    "start-process powershell -NoNewWindow -ArgumentList '-command \"{}\"'",
                    commands.join(";")
                );
                self.executor.spawn("powershell", &["-command", &script])
            }
            "macos" | "linux" => {
                let script = format!("({}) &", commands.join(";"));
                self.executor.spawn("sh", &["-c", &script])
            }
            _ => return Err(TimerError::UnsupportedPlatform { os }),
        };
        result.map_err(|source| TimerError::Command { os, source })
    }

    fn timer(&self, minutes: u32, label: &str, message: &str) -> Result<(), TimerError> {
        let seconds = u64::from(minutes) * 60;
        let ends_at = (Local::now() + Duration::minutes(i64::from(minutes)))
            .format("%H:%M")
            .to_string();
        tracing::debug!(minutes, seconds, ends_at = %ends_at, "Starting {label}");

        if !self.config.timer_local {
            self.say
                .warning("no timer started; local timers are disabled (MOB_TIMER_LOCAL=false)");
            return Ok(());
        }

        let mut commands = vec![format!("sleep {seconds}")];
        commands.extend(optional_command(&self.config.voice_command, message)?);
        commands.extend(optional_command(&self.config.notify_command, message)?);
        self.run_in_background(&commands)?;

        self.say.info(&format!(
            "It's now {}. {minutes} min {label} ends at approx. {ends_at}. Happy collaborating! :)",
            current_time()
        ));
        Ok(())
    }
}

impl SessionNotifier for LocalTimer {
    fn start_timer(&self, minutes: u32) -> Result<(), TimerError> {
        self.timer(minutes, "timer", &self.config.voice_message)
    }

    fn start_break_timer(&self, minutes: u32) -> Result<(), TimerError> {
        self.timer(minutes, "break timer", &self.config.mob("start"))
    }

    fn moo(&self) -> Result<(), TimerError> {
        let voice = optional_command(&self.config.voice_command, "moo")?;
        self.run_in_background(&voice.into_iter().collect::<Vec<_>>())?;
        self.say.info("moo");
        Ok(())
    }
}
