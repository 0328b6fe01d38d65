use std::fmt;
use thiserror::Error;

use crate::external::GitError;

/// Actionable remedy shown with a user-facing error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub instruction: String,
    pub command: String,
}

impl Fix {
    pub fn new(instruction: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            command: command.into(),
        }
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.instruction, self.command)
    }
}

#[derive(Debug, Error)]
pub enum MobError {
    /// The repository was left exactly as found.
    #[error("{message}")]
    Precondition { message: String, fix: Option<Fix> },

    /// A repository command failed; earlier steps of the operation are not rolled back.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The resolver produced an inconsistent pair for the current branch.
    #[error("internal invariant violated: current branch '{current}' resolved to base '{base}' and wip '{wip}'")]
    InvariantViolation {
        current: String,
        base: String,
        wip: String,
    },

    #[error("{message}")]
    Environment { message: String },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl MobError {
    pub fn precondition(message: impl Into<String>) -> Self {
        MobError::Precondition {
            message: message.into(),
            fix: None,
        }
    }

    pub fn precondition_with_fix(message: impl Into<String>, fix: Fix) -> Self {
        MobError::Precondition {
            message: message.into(),
            fix: Some(fix),
        }
    }

    pub fn is_defect(&self) -> bool {
        matches!(self, MobError::InvariantViolation { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MobError::Precondition { .. } | MobError::Git(_) | MobError::Config(_) => 1,
            MobError::Environment { .. } => 2,
            // EX_SOFTWARE
            MobError::InvariantViolation { .. } => 70,
        }
    }
}
