use crate::errors::MobError;
use crate::session::StartOutcome;
use crate::timer::to_minutes;

use super::CommandContext;

pub struct StartCommand {
    pub minutes: Option<String>,
}

impl StartCommand {
    pub fn new(minutes: Option<String>) -> Self {
        Self { minutes }
    }

    /// Timer length from the argument, falling back to the configured default.
    fn timer_minutes(&self, context: &CommandContext) -> Option<u32> {
        self.minutes
            .as_deref()
            .or_else(|| Some(context.config.timer.as_str()).filter(|timer| !timer.is_empty()))
            .map(to_minutes)
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        let outcome = context.controller()?.start(self.timer_minutes(context))?;
        if let StartOutcome::Created(pair) = outcome {
            tracing::debug!(wip = %pair.wip, "Created new wip branch");
        }
        Ok(())
    }
}
