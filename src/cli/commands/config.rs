use crate::errors::MobError;

use super::CommandContext;

/// Prints the effective configuration in `.mob` file syntax
pub struct ConfigCommand;

impl ConfigCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        for line in context.config.to_assignments() {
            context.say.say(&line);
        }
        Ok(())
    }
}
