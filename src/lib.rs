// mob - fast git handover for remote pair and mob programming
// This exposes the core components for testing and integration

pub mod branch;
pub mod cli;
pub mod config;
pub mod errors;
pub mod external;
pub mod git;
pub mod output;
pub mod session;
pub mod telemetry;
pub mod timer;

// Re-export key types for easy access
pub use branch::Branch;
pub use config::{DoneSquash, MobConfig};
pub use errors::{Fix, MobError};
pub use external::{CommandExecutor, GitClient, GitError, GitRepository, ProcessCommandExecutor};
pub use git::{discover_repository, RepositoryLocation};
pub use output::{BufferSink, OutputSink, Say, StdoutSink};
pub use session::{
    determine_branches, DoneOutcome, NextOutcome, SessionController, SessionPair, StartOutcome,
};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use timer::{LocalTimer, SessionNotifier};
