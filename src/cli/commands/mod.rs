use std::sync::Arc;

use crate::config::{user_config_path, MobConfig};
use crate::errors::MobError;
use crate::external::{CommandExecutor, GitClient, ProcessCommandExecutor};
use crate::git::{discover_repository, RepositoryLocation};
use crate::output::Say;
use crate::session::SessionController;
use crate::telemetry::{create_command_span, generate_correlation_id};
use crate::timer::LocalTimer;

use super::Commands;

pub mod clean;
pub mod config;
pub mod done;
pub mod next;
pub mod reset;
pub mod squash_wip;
pub mod start;
pub mod status;
pub mod timer;

/// Everything a command needs for one invocation
pub struct CommandContext {
    pub config: MobConfig,
    pub say: Say,
    pub location: Option<RepositoryLocation>,
    pub executor: Arc<dyn CommandExecutor>,
    repo: Option<GitClient>,
    timer: LocalTimer,
}

impl CommandContext {
    pub fn new(
        config: MobConfig,
        say: Say,
        location: Option<RepositoryLocation>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let repo = location
            .as_ref()
            .map(|_| GitClient::new(executor.clone()).with_echo(say.sink()));
        let timer = LocalTimer::new(executor.clone(), config.clone(), say.clone());
        Self {
            config,
            say,
            location,
            executor,
            repo,
            timer,
        }
    }

    pub fn repository(&self) -> Result<&GitClient, MobError> {
        self.repo.as_ref().ok_or_else(|| MobError::Environment {
            message: "expecting the current working directory to be a git repository.".to_string(),
        })
    }

    pub fn timer(&self) -> &LocalTimer {
        &self.timer
    }

    /// Lifecycle controller wired to the real repository, timer and launcher.
    pub fn controller(&self) -> Result<SessionController<'_>, MobError> {
        Ok(SessionController::new(self.repository()?, &self.config, self.say.clone())
            .with_notifier(&self.timer)
            .with_launcher(self.executor.as_ref()))
    }
}

/// Load configuration for the working directory and run `command`.
pub fn run(command: Commands, say: Say) -> Result<(), MobError> {
    let correlation_id = generate_correlation_id();
    let span = create_command_span(command.name(), &correlation_id);
    let _guard = span.enter();

    let cwd = std::env::current_dir().map_err(|e| MobError::Environment {
        message: format!("cannot determine the current working directory: {e}"),
    })?;
    let location = match discover_repository(&cwd) {
        Ok(location) => Some(location),
        Err(e) => {
            tracing::debug!(error = %e, "Continuing without repository");
            None
        }
    };

    let user_file = user_config_path();
    let project_file = location.as_ref().map(RepositoryLocation::project_config_path);
    let mut config = MobConfig::load(user_file.as_deref(), project_file.as_deref())?;
    command.apply_overrides(&mut config);
    tracing::debug!(config = ?config, "Effective configuration");

    let context = CommandContext::new(
        config,
        say,
        location,
        Arc::new(ProcessCommandExecutor::new()),
    );

    match command {
        Commands::Start { minutes, .. } => start::StartCommand::new(minutes).execute(&context),
        Commands::Next { .. } => next::NextCommand::new().execute(&context),
        Commands::Done { .. } => done::DoneCommand::new().execute(&context),
        Commands::Reset { .. } => reset::ResetCommand::new().execute(&context),
        Commands::Clean => clean::CleanCommand::new().execute(&context),
        Commands::Status => status::StatusCommand::new().execute(&context),
        Commands::Fetch => status::FetchCommand::new().execute(&context),
        Commands::Branch => status::BranchCommand::new().execute(&context),
        Commands::Config => config::ConfigCommand::new().execute(&context),
        Commands::Timer { minutes } => timer::TimerCommand::new(minutes).execute(&context),
        Commands::Break { minutes } => timer::BreakCommand::new(minutes).execute(&context),
        Commands::Moo => timer::MooCommand::new().execute(&context),
        Commands::SquashWip {
            git_editor, file, ..
        } => squash_wip::SquashWipCommand::new(git_editor, file).execute(&context),
    }
}
