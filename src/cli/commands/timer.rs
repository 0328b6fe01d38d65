use crate::errors::{Fix, MobError};
use crate::timer::{to_minutes, SessionNotifier, TimerError};

use super::CommandContext;

fn required_minutes(
    minutes: &Option<String>,
    context: &CommandContext,
    command: &str,
) -> Result<u32, MobError> {
    let minutes = minutes
        .as_deref()
        .or_else(|| Some(context.config.timer.as_str()).filter(|timer| !timer.is_empty()))
        .map(to_minutes)
        .filter(|minutes| *minutes > 0);
    minutes.ok_or_else(|| {
        MobError::precondition_with_fix(
            "no timer duration given",
            Fix::new("To start a 10 minute timer, use", context.config.mob(&format!("{command} 10"))),
        )
    })
}

fn report(context: &CommandContext, result: Result<(), TimerError>) -> Result<(), MobError> {
    result.map_err(|e| MobError::Environment {
        message: e.to_string(),
    })?;
    context.say.empty_line();
    Ok(())
}

pub struct TimerCommand {
    pub minutes: Option<String>,
}

impl TimerCommand {
    pub fn new(minutes: Option<String>) -> Self {
        Self { minutes }
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        let minutes = required_minutes(&self.minutes, context, "timer")?;
        report(context, context.timer().start_timer(minutes))
    }
}

pub struct BreakCommand {
    pub minutes: Option<String>,
}

impl BreakCommand {
    pub fn new(minutes: Option<String>) -> Self {
        Self { minutes }
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        let minutes = required_minutes(&self.minutes, context, "break")?;
        report(context, context.timer().start_break_timer(minutes))
    }
}

pub struct MooCommand;

impl MooCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context
            .timer()
            .moo()
            .map_err(|e| MobError::Environment {
                message: format!("can't run voice command on your system: {e}"),
            })
    }
}
