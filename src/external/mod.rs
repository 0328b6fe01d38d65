//! External tool abstractions
//!
//! Trait-based abstractions for the `git` CLI and process execution, so the
//! session lifecycle can be tested with in-memory repositories.

pub mod command;
pub mod git;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use git::{GitClient, GitError, GitRepository, PushOptions};
