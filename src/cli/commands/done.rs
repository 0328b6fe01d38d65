use crate::errors::MobError;
use crate::session::DoneOutcome;

use super::CommandContext;

pub struct DoneCommand;

impl DoneCommand {
    pub fn new() -> Self {
        Self
    }

    /// A merge conflict is reported but leaves the exit status at zero;
    /// resolving it is part of the normal workflow.
    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        match context.controller()?.done()? {
            DoneOutcome::MergeConflict { wip } => {
                tracing::warn!(wip = %wip, "done stopped at a merge conflict");
            }
            outcome => tracing::debug!(outcome = ?outcome, "done finished"),
        }
        Ok(())
    }
}
