use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DoneSquash, MobConfig};

pub mod commands;

#[derive(Parser)]
#[command(name = "mob", version)]
#[command(about = "Fast git handover for remote pair and mob programming")]
#[command(long_about = "mob keeps a shared wip branch per base branch, so whoever types next \
                       picks up exactly where the previous typist stopped. Start with 'mob start', \
                       hand over with 'mob next', and finish with 'mob done'.")]
pub struct Cli {
    /// Print diagnostic logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start session from base branch in wip branch
    #[command(visible_alias = "s")]
    Start {
        /// Start a timer of this many minutes
        minutes: Option<String>,
        /// Move uncommitted changes to the wip branch
        #[arg(short = 'i', long)]
        include_uncommitted_changes: bool,
        /// Qualify the wip branch, e.g. 'mob/<base-branch>-<branch>'
        #[arg(short = 'b', long)]
        branch: Option<String>,
    },
    /// Hand over changes in the wip branch to the next person
    #[command(visible_alias = "n")]
    Next {
        /// Stay on the wip branch (default)
        #[arg(short = 's', long, conflicts_with = "return_to_base_branch")]
        stay: bool,
        /// Return to the base branch afterwards
        #[arg(short = 'r', long)]
        return_to_base_branch: bool,
        /// Override the wip commit message
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Merge the wip branch into the base branch index and end the session
    #[command(visible_alias = "d")]
    #[command(group(ArgGroup::new("mode").args(["squash", "no_squash", "squash_wip"])))]
    Done {
        /// Squash all commits from the wip branch
        #[arg(long)]
        squash: bool,
        /// Merge the wip branch without squashing
        #[arg(long)]
        no_squash: bool,
        /// Squash wip commits, keep manual commits
        #[arg(long)]
        squash_wip: bool,
    },
    /// Remove the local and remote wip branch
    Reset {
        /// Qualify the wip branch, e.g. 'mob/<base-branch>-<branch>'
        #[arg(short = 'b', long)]
        branch: Option<String>,
    },
    /// Remove all orphan wip branches
    Clean,
    /// Show the current session
    Status,
    /// Fetch from the remote
    Fetch,
    /// List remote wip branches
    #[command(visible_alias = "b")]
    Branch,
    /// Print the effective configuration
    Config,
    /// Start a timer
    #[command(visible_alias = "t")]
    Timer {
        minutes: Option<String>,
    },
    /// Start a break timer
    Break {
        minutes: Option<String>,
    },
    /// Moo!
    Moo,
    /// Rebase editor used by 'done --squash-wip'
    #[command(hide = true)]
    #[command(group(ArgGroup::new("editor").args(["git_editor", "git_sequence_editor"]).required(true)))]
    SquashWip {
        #[arg(long)]
        git_editor: bool,
        #[arg(long)]
        git_sequence_editor: bool,
        file: PathBuf,
    },
}

impl Commands {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Start { .. } => "start",
            Commands::Next { .. } => "next",
            Commands::Done { .. } => "done",
            Commands::Reset { .. } => "reset",
            Commands::Clean => "clean",
            Commands::Status => "status",
            Commands::Fetch => "fetch",
            Commands::Branch => "branch",
            Commands::Config => "config",
            Commands::Timer { .. } => "timer",
            Commands::Break { .. } => "break",
            Commands::Moo => "moo",
            Commands::SquashWip { .. } => "squash-wip",
        }
    }

    /// Command line flags take precedence over every configuration source.
    pub fn apply_overrides(&self, config: &mut MobConfig) {
        match self {
            Commands::Start {
                include_uncommitted_changes,
                branch,
                ..
            } => {
                if *include_uncommitted_changes {
                    config.start_include_uncommitted_changes = true;
                }
                if let Some(branch) = branch {
                    config.wip_branch_qualifier = branch.clone();
                }
            }
            Commands::Next {
                stay,
                return_to_base_branch,
                message,
            } => {
                if *stay {
                    config.next_stay = true;
                }
                if *return_to_base_branch {
                    config.next_stay = false;
                }
                if message.is_some() {
                    config.custom_commit_message = message.clone();
                }
            }
            Commands::Done {
                squash,
                no_squash,
                squash_wip,
            } => {
                if *squash {
                    config.done_squash = DoneSquash::Squash;
                } else if *no_squash {
                    config.done_squash = DoneSquash::NoSquash;
                } else if *squash_wip {
                    config.done_squash = DoneSquash::SquashWip;
                }
            }
            Commands::Reset { branch: Some(branch) } => {
                config.wip_branch_qualifier = branch.clone();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command.unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases() {
        assert_eq!(parse(&["mob", "s", "10"]).name(), "start");
        assert_eq!(parse(&["mob", "n"]).name(), "next");
        assert_eq!(parse(&["mob", "d"]).name(), "done");
        assert_eq!(parse(&["mob", "t", "5"]).name(), "timer");
    }

    #[test]
    fn test_start_flags_override_config() {
        let mut config = MobConfig::default();
        parse(&["mob", "start", "-i", "--branch", "green"]).apply_overrides(&mut config);
        assert!(config.start_include_uncommitted_changes);
        assert_eq!(config.wip_branch_qualifier, "green");
    }

    #[test]
    fn test_next_flags_override_config() {
        let mut config = MobConfig::default();
        parse(&["mob", "next", "-r", "-m", "Extract parser"]).apply_overrides(&mut config);
        assert!(!config.next_stay);
        assert_eq!(config.commit_message(), "Extract parser");
    }

    #[test]
    fn test_done_modes_are_exclusive() {
        let mut config = MobConfig::default();
        parse(&["mob", "done", "--squash-wip"]).apply_overrides(&mut config);
        assert_eq!(config.done_squash, DoneSquash::SquashWip);
        assert!(Cli::try_parse_from(["mob", "done", "--squash", "--no-squash"]).is_err());
    }

    #[test]
    fn test_squash_wip_requires_editor_mode() {
        assert!(Cli::try_parse_from(["mob", "squash-wip", "todo"]).is_err());
        assert_eq!(
            parse(&["mob", "squash-wip", "--git-editor", "COMMIT_EDITMSG"]).name(),
            "squash-wip"
        );
    }
}
