use crate::errors::MobError;

use super::CommandContext;

pub struct StatusCommand;

impl StatusCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context.controller()?.status()
    }
}

/// Lists remote wip branches
pub struct BranchCommand;

impl BranchCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context.controller()?.wip_branches()?;
        Ok(())
    }
}

pub struct FetchCommand;

impl FetchCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        context.controller()?.fetch()
    }
}
