use crate::errors::MobError;

use super::CommandContext;

pub struct ResetCommand;

impl ResetCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context.controller()?.reset()?;
        Ok(())
    }
}
