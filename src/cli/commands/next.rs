use crate::errors::MobError;

use super::CommandContext;

pub struct NextCommand;

impl NextCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context.controller()?.next()?;
        Ok(())
    }
}
