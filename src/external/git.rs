//! Git command abstractions
//!
//! Provides the repository facade used by the session lifecycle. Every
//! operation is one or two `git` invocations; output is returned as trimmed
//! text and failures carry the command line and its combined output.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::command::{CommandError, CommandExecutor, CommandOutput};
use crate::branch::Branch;
use crate::output::OutputSink;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("expecting the current working directory to be a git repository")]
    NotARepository,
    #[error("{command}\n{output}\n{message}")]
    CommandFailed {
        command: String,
        output: String,
        message: String,
    },
    #[error("unexpected output from '{command}': {output}")]
    UnexpectedOutput { command: String, output: String },
    #[error("Command execution error: {source}")]
    CommandError {
        #[from]
        source: CommandError,
    },
}

/// Flags for a single push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub set_upstream: bool,
    pub delete: bool,
    /// Overwrite the remote branch after history was rewritten
    pub force: bool,
    pub hooks_enabled: bool,
}

/// Trait for Git repository operations
///
/// This abstraction enables testing the session lifecycle without actual
/// repository manipulation.
pub trait GitRepository {
    fn current_branch(&self) -> Result<Branch, GitError>;

    fn local_branches(&self) -> Result<Vec<String>, GitError>;

    /// Remote-tracking branches of `remote`, as `<remote>/<branch>`
    fn remote_branches(&self, remote: &str) -> Result<Vec<String>, GitError>;

    /// Object id a fully qualified ref points to, `None` when it does not exist
    fn object_id(&self, reference: &str) -> Result<Option<String>, GitError>;

    /// Number of commits reachable from `reference` but not from `not_in`
    fn count_commits_only_in(&self, reference: &str, not_in: &str) -> Result<u32, GitError>;

    fn fetch(&self, remote: &str, prune: bool) -> Result<(), GitError>;

    /// Switch to `branch`, (re)creating it at `create_from` when given
    fn checkout(&self, branch: &str, create_from: Option<&str>) -> Result<(), GitError>;

    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<(), GitError>;

    fn push(&self, remote: &str, branch: &str, options: PushOptions) -> Result<(), GitError>;

    fn delete_local_branch(&self, branch: &str, force: bool) -> Result<(), GitError>;

    /// Stage everything, including untracked files, and commit
    fn commit_all(&self, message: &str, hooks_enabled: bool) -> Result<(), GitError>;

    fn merge_fast_forward_only(&self, reference: &str) -> Result<(), GitError>;

    /// Merge without committing, either squashed or as a pending merge
    fn merge_squash_or_no_commit(&self, reference: &str, squash: bool) -> Result<(), GitError>;

    /// Stash tracked and untracked changes under `message`
    fn stash_push(&self, message: &str) -> Result<(), GitError>;

    fn stash_list(&self) -> Result<String, GitError>;

    fn stash_pop(&self, stash: &str) -> Result<(), GitError>;

    fn soft_reset_last_commit(&self) -> Result<(), GitError>;

    /// `git status --short`
    fn status_short(&self) -> Result<String, GitError>;

    fn untracked_files(&self) -> Result<String, GitError>;

    fn unstaged_changes(&self) -> Result<String, GitError>;

    fn cached_changes(&self) -> Result<String, GitError>;

    fn changes_of_last_commit(&self) -> Result<String, GitError>;

    /// Tracked files below the working directory, empty inside an uncommitted directory
    fn tracked_files_in_working_dir(&self) -> Result<String, GitError>;

    fn head_commit_hash(&self) -> Option<String>;

    /// One entry per commit in `range`, newest first
    fn log(&self, range: &str, format: &str) -> Result<Vec<String>, GitError>;

    fn last_commit_message(&self) -> Result<String, GitError>;

    fn user_name(&self) -> Option<String>;

    fn user_email(&self) -> Option<String>;

    fn git_dir(&self) -> Result<PathBuf, GitError>;

    fn root_dir(&self) -> Result<PathBuf, GitError>;

    fn merge_base(&self, first: &str, second: &str) -> Result<String, GitError>;

    /// Interactive rebase onto `onto` driven by the given editor commands
    fn rebase_interactive(
        &self,
        onto: &str,
        sequence_editor: &str,
        editor: &str,
    ) -> Result<(), GitError>;

    fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        Ok(!self.status_short()?.is_empty())
    }
}

/// Real Git implementation
pub struct GitClient {
    executor: Arc<dyn CommandExecutor>,
    echo: Option<Arc<dyn OutputSink>>,
}

impl GitClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            echo: None,
        }
    }

    /// Print every repository-changing command, indented, to `sink`.
    pub fn with_echo(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.echo = Some(sink);
        self
    }

    fn invoke(&self, args: &[&str], env: &[(&str, &str)]) -> Result<(String, CommandOutput), GitError> {
        let command = format!("git {}", args.join(" "));
        let output = self.executor.execute("git", args, env)?;
        Ok((command, output))
    }

    fn fail(command: String, output: &CommandOutput) -> GitError {
        let combined = output.combined();
        if combined.contains("not a git repository") {
            return GitError::NotARepository;
        }
        GitError::CommandFailed {
            command,
            output: combined.trim().to_string(),
            message: format!("exit status: {}", output.status_code),
        }
    }

    /// Read-only query, not echoed.
    fn silent(&self, args: &[&str]) -> Result<String, GitError> {
        let (command, output) = self.invoke(args, &[])?;
        if !output.success() {
            return Err(Self::fail(command, &output));
        }
        Ok(output.stdout.trim().to_string())
    }

    fn silent_ignore_failure(&self, args: &[&str]) -> Option<String> {
        match self.invoke(args, &[]) {
            Ok((_, output)) if output.success() => Some(output.stdout.trim().to_string()),
            _ => None,
        }
    }

    /// Repository-changing command, echoed on success.
    fn run(&self, args: &[&str]) -> Result<(), GitError> {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Result<(), GitError> {
        let (command, output) = self.invoke(args, env)?;
        if !output.success() {
            return Err(Self::fail(command, &output));
        }
        if let Some(echo) = &self.echo {
            echo.print(&format!("  {command}\n"));
        }
        Ok(())
    }

    fn lines(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn hooks_flag(hooks_enabled: bool) -> Option<&'static str> {
    if hooks_enabled {
        None
    } else {
        Some("--no-verify")
    }
}

impl GitRepository for GitClient {
    fn current_branch(&self) -> Result<Branch, GitError> {
        // `branch --show-current` needs git 2.22
        let name = self.silent(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(Branch::new(name))
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        let output = self.silent(&["branch", "--format=%(refname:short)"])?;
        Ok(Self::lines(&output))
    }

    fn remote_branches(&self, remote: &str) -> Result<Vec<String>, GitError> {
        let output = self.silent(&["branch", "--remotes", "--format=%(refname:short)"])?;
        let prefix = format!("{remote}/");
        Ok(Self::lines(&output)
            .into_iter()
            .filter(|branch| branch.starts_with(&prefix))
            .collect())
    }

    fn object_id(&self, reference: &str) -> Result<Option<String>, GitError> {
        let output = self.silent(&["for-each-ref", "--format=%(objectname)", reference])?;
        Ok(Self::lines(&output).into_iter().next())
    }

    fn count_commits_only_in(&self, reference: &str, not_in: &str) -> Result<u32, GitError> {
        let range = format!("{reference}...{not_in}");
        let args = ["rev-list", "--count", "--left-only", range.as_str()];
        let output = self.silent(&args)?;
        output.parse::<u32>().map_err(|_| GitError::UnexpectedOutput {
            command: format!("git {}", args.join(" ")),
            output,
        })
    }

    fn fetch(&self, remote: &str, prune: bool) -> Result<(), GitError> {
        if prune {
            self.run(&["fetch", remote, "--prune"])
        } else {
            self.run(&["fetch", remote])
        }
    }

    fn checkout(&self, branch: &str, create_from: Option<&str>) -> Result<(), GitError> {
        match create_from {
            Some(start_point) => self.run(&["checkout", "-B", branch, start_point]),
            None => self.run(&["checkout", branch]),
        }
    }

    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<(), GitError> {
        let flag = format!("--set-upstream-to={upstream}");
        self.run(&["branch", &flag, branch])
    }

    fn push(&self, remote: &str, branch: &str, options: PushOptions) -> Result<(), GitError> {
        let mut args = vec!["push"];
        args.extend(hooks_flag(options.hooks_enabled));
        if options.set_upstream {
            args.push("--set-upstream");
        }
        if options.force {
            args.push("--force");
        }
        args.push(remote);
        if options.delete {
            args.push("--delete");
        }
        args.push(branch);
        self.run(&args)
    }

    fn delete_local_branch(&self, branch: &str, force: bool) -> Result<(), GitError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, branch])
    }

    fn commit_all(&self, message: &str, hooks_enabled: bool) -> Result<(), GitError> {
        self.run(&["add", "--all"])?;
        let mut args = vec!["commit", "--message", message];
        args.extend(hooks_flag(hooks_enabled));
        self.run(&args)
    }

    fn merge_fast_forward_only(&self, reference: &str) -> Result<(), GitError> {
        self.run(&["merge", reference, "--ff-only"])
    }

    fn merge_squash_or_no_commit(&self, reference: &str, squash: bool) -> Result<(), GitError> {
        let mode = if squash { "--squash" } else { "--no-commit" };
        self.run(&["merge", mode, "--ff", reference])
    }

    fn stash_push(&self, message: &str) -> Result<(), GitError> {
        self.run(&["stash", "push", "--include-untracked", "--message", message])
    }

    fn stash_list(&self) -> Result<String, GitError> {
        self.silent(&["stash", "list"])
    }

    fn stash_pop(&self, stash: &str) -> Result<(), GitError> {
        self.run(&["stash", "pop", stash])
    }

    fn soft_reset_last_commit(&self) -> Result<(), GitError> {
        self.run(&["reset", "--soft", "HEAD^"])
    }

    fn status_short(&self) -> Result<String, GitError> {
        self.silent(&["status", "--short"])
    }

    fn untracked_files(&self) -> Result<String, GitError> {
        self.silent(&["ls-files", "--others", "--exclude-standard", "--full-name"])
    }

    fn unstaged_changes(&self) -> Result<String, GitError> {
        self.silent(&["diff", "--stat"])
    }

    fn cached_changes(&self) -> Result<String, GitError> {
        self.silent(&["diff", "--cached", "--stat"])
    }

    fn changes_of_last_commit(&self) -> Result<String, GitError> {
        // the first commit of a repository has no parent to diff against
        Ok(self
            .silent_ignore_failure(&["diff", "HEAD^1", "--stat"])
            .unwrap_or_default())
    }

    fn tracked_files_in_working_dir(&self) -> Result<String, GitError> {
        self.silent(&["ls-tree", "-r", "HEAD", "--full-name", "--name-only", "."])
    }

    fn head_commit_hash(&self) -> Option<String> {
        self.silent_ignore_failure(&["rev-parse", "HEAD"])
    }

    fn log(&self, range: &str, format: &str) -> Result<Vec<String>, GitError> {
        let pretty = format!("--pretty=format:{format}");
        let output = self.silent(&["--no-pager", "log", range, &pretty, "--abbrev-commit"])?;
        Ok(Self::lines(&output.replace("\r\n", "\n")))
    }

    fn last_commit_message(&self) -> Result<String, GitError> {
        self.silent(&["log", "-1", "--pretty=format:%B"])
    }

    fn user_name(&self) -> Option<String> {
        self.silent_ignore_failure(&["config", "--get", "user.name"])
            .filter(|name| !name.is_empty())
    }

    fn user_email(&self) -> Option<String> {
        self.silent_ignore_failure(&["config", "--get", "user.email"])
            .filter(|email| !email.is_empty())
    }

    fn git_dir(&self) -> Result<PathBuf, GitError> {
        self.silent(&["rev-parse", "--absolute-git-dir"])
            .map(PathBuf::from)
    }

    fn root_dir(&self) -> Result<PathBuf, GitError> {
        self.silent(&["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
    }

    fn merge_base(&self, first: &str, second: &str) -> Result<String, GitError> {
        self.silent(&["merge-base", first, second])
    }

    fn rebase_interactive(
        &self,
        onto: &str,
        sequence_editor: &str,
        editor: &str,
    ) -> Result<(), GitError> {
        self.run_with_env(
            &["rebase", "--interactive", "--keep-empty", onto],
            &[("GIT_SEQUENCE_EDITOR", sequence_editor), ("GIT_EDITOR", editor)],
        )
    }
}
