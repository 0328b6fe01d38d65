use std::path::PathBuf;

use crate::errors::MobError;
use crate::session::squash_wip::{run_commit_editor, run_sequence_editor};

use super::CommandContext;

/// Invoked by git during `done --squash-wip`, never by users
pub struct SquashWipCommand {
    pub git_editor: bool,
    pub file: PathBuf,
}

impl SquashWipCommand {
    pub fn new(git_editor: bool, file: PathBuf) -> Self {
        Self { git_editor, file }
    }

    pub fn execute(&self, context: &CommandContext) -> Result<(), MobError> {
        if self.git_editor {
            run_commit_editor(&self.file, &context.config)
        } else {
            run_sequence_editor(&self.file, &context.config)
        }
    }
}
