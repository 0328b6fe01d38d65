use crate::errors::MobError;

use super::CommandContext;

pub struct CleanCommand;

impl CleanCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        let removed = context.controller()?.clean()?;
        if removed.is_empty() {
            context.say.info("no orphan wip branches found");
        }
        Ok(())
    }
}
