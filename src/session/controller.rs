//! Session lifecycle: start, next, done, reset and clean
//!
//! Every operation reads the repository state it needs, resolves the session
//! pair once and then drives the repository facade. A failure in a facade
//! call aborts the operation; earlier repository changes stay in place.

use crate::branch::Branch;
use crate::config::{DoneSquash, MobConfig};
use crate::errors::{Fix, MobError};
use crate::external::{CommandExecutor, GitRepository, PushOptions};
use crate::output::Say;
use crate::timer::{current_time, SessionNotifier};

use super::history::{self, find_next_typist, last_commits, wip_commit_message};
use super::resolver::{determine_branches, wip_branches_for_base, SessionPair};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Joined a wip branch that already existed on the remote
    Joined(SessionPair),
    /// Created the wip branch and pushed it
    Created(SessionPair),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    NotInSession,
    NothingToCommit,
    PushedLocalCommits,
    Committed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoneOutcome {
    NotInSession,
    /// Work sits in the base branch index; the wip branch is gone locally and remotely
    Merged(SessionPair),
    /// Merge into base failed; both wip branches were left in place
    MergeConflict { wip: Branch },
    /// The remote wip branch had already been deleted
    AlreadyEnded(SessionPair),
}

pub struct SessionController<'a> {
    repo: &'a dyn GitRepository,
    config: &'a MobConfig,
    say: Say,
    notifier: Option<&'a dyn SessionNotifier>,
    launcher: Option<&'a dyn CommandExecutor>,
    editor_command: Option<String>,
}

impl<'a> SessionController<'a> {
    pub fn new(repo: &'a dyn GitRepository, config: &'a MobConfig, say: Say) -> Self {
        Self {
            repo,
            config,
            say,
            notifier: None,
            launcher: None,
            editor_command: None,
        }
    }

    /// Timer and voice notifications after `start`.
    pub fn with_notifier(mut self, notifier: &'a dyn SessionNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Process launcher for the configured open command.
    pub fn with_launcher(mut self, launcher: &'a dyn CommandExecutor) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Command that runs this tool, used as rebase editor for `--squash-wip`.
    pub fn with_editor_command(mut self, command: impl Into<String>) -> Self {
        self.editor_command = Some(command.into());
        self
    }

    fn remote(&self) -> &str {
        &self.config.remote_name
    }

    fn push_options(&self) -> PushOptions {
        PushOptions {
            hooks_enabled: self.config.git_hooks_enabled,
            ..PushOptions::default()
        }
    }

    fn current_pair(&self) -> Result<(Branch, SessionPair), MobError> {
        let current = self.repo.current_branch()?;
        let local_branches = self.repo.local_branches()?;
        let pair = determine_branches(&current, &local_branches, self.config)?;
        Ok((current, pair))
    }

    fn say_fix_start(&self) {
        self.say
            .fix("to start working together, use", &self.config.mob("start"));
    }

    pub fn start(&self, timer_minutes: Option<u32>) -> Result<StartOutcome, MobError> {
        let uncommitted = self.repo.has_uncommitted_changes()?;
        if uncommitted && !self.config.start_include_uncommitted_changes {
            self.say_uncommitted_changes()?;
            return Err(MobError::precondition_with_fix(
                "cannot start; clean working tree required",
                Fix::new(
                    "To start, including uncommitted changes, use",
                    self.config.mob("start --include-uncommitted-changes"),
                ),
            ));
        }

        self.repo.fetch(self.remote(), true)?;
        let (current, pair) = self.current_pair()?;
        let remote_branches = self.repo.remote_branches(self.remote())?;

        if !pair.base.has_remote_branch(&remote_branches, self.config) {
            return Err(MobError::precondition_with_fix(
                format!("Remote branch {} is missing", pair.base.remote(self.config)),
                Fix::new(
                    "To set the upstream branch, use",
                    format!("git push {} {} --set-upstream", self.remote(), pair.base),
                ),
            ));
        }

        let unpushed = pair.base.unpushed_commits(self.repo, self.config)?;
        if unpushed > 0 {
            self.say.info(&format!(
                "there are {unpushed} unpushed commits on local base branch <{}>",
                pair.base
            ));
            return Err(MobError::precondition_with_fix(
                "cannot start; unpushed changes on base branch must be pushed upstream",
                Fix::new(
                    "to fix this, push those commits and try again",
                    format!("git push {} {}", self.remote(), pair.base),
                ),
            ));
        }

        if uncommitted && self.repo.tracked_files_in_working_dir()?.is_empty() {
            return Err(MobError::precondition_with_fix(
                "cannot start; current working dir is an uncommitted subdir",
                Fix::new("to fix this, go to the parent directory and try again", "cd .."),
            ));
        }

        if uncommitted {
            self.repo.stash_push(&self.config.stash_name)?;
            self.say.info(
                "uncommitted changes were stashed. If an error occurs later on, you can recover them with 'git stash pop'.",
            );
        }

        if current == pair.base {
            self.repo
                .merge_fast_forward_only(pair.base.remote(self.config).name())?;
        }

        let outcome = if pair.wip.has_remote_branch(&remote_branches, self.config) {
            let upstream = pair.wip.remote(self.config);
            self.say
                .info(&format!("joining existing session from {upstream}"));
            self.repo.checkout(pair.wip.name(), Some(upstream.name()))?;
            self.repo.set_upstream(pair.wip.name(), upstream.name())?;
            StartOutcome::Joined(pair.clone())
        } else {
            self.warn_for_active_wip_branches(&current, &pair, &remote_branches);
            self.say.info(&format!(
                "starting new session from {}",
                pair.base.remote(self.config)
            ));
            self.repo
                .checkout(pair.wip.name(), Some(pair.base.remote(self.config).name()))?;
            self.repo.push(
                self.remote(),
                pair.wip.name(),
                PushOptions {
                    set_upstream: true,
                    ..self.push_options()
                },
            )?;
            StartOutcome::Created(pair.clone())
        };

        if uncommitted {
            self.restore_stash()?;
        }

        tracing::info!(base = %pair.base, wip = %pair.wip, joined = matches!(outcome, StartOutcome::Joined(_)), "Session started");
        self.say.info(&format!(
            "you are on wip branch '{}' (base branch '{}')",
            pair.wip, pair.base
        ));
        self.say_last_commits(&pair)?;
        self.open_last_modified_file_if_present();
        self.notify_started(timer_minutes);

        Ok(outcome)
    }

    fn say_uncommitted_changes(&self) -> Result<(), MobError> {
        self.say.info("cannot start; clean working tree required");
        let unstaged = self.repo.unstaged_changes()?;
        if !unstaged.is_empty() {
            self.say.info("unstaged changes present:");
            self.say.info_indented(&unstaged);
        }
        let untracked = self.repo.untracked_files()?;
        if !untracked.is_empty() {
            self.say.info("untracked files present:");
            self.say.info_indented(&untracked);
        }
        Ok(())
    }

    fn restore_stash(&self) -> Result<(), MobError> {
        let stashes = self.repo.stash_list()?;
        match history::find_stash_by_name(&stashes, &self.config.stash_name) {
            Some(stash) => self.repo.stash_pop(&stash)?,
            None => self.say.warning(&format!(
                "could not find stash '{}'; recover your changes with 'git stash list'",
                self.config.stash_name
            )),
        }
        Ok(())
    }

    fn warn_for_active_wip_branches(
        &self,
        current: &Branch,
        pair: &SessionPair,
        remote_branches: &[String],
    ) {
        if current == &pair.wip {
            return;
        }
        let existing = wip_branches_for_base(&pair.base, remote_branches, self.config);
        if !existing.is_empty() && !self.config.custom_wip_branch_qualifier_configured() {
            self.say.warning(
                "Creating a new wip branch even though preexisting wip branches have been detected.",
            );
            for wip in existing {
                self.say.with_prefix(&wip, "  - ");
            }
        }
    }

    fn notify_started(&self, timer_minutes: Option<u32>) {
        match (self.notifier, timer_minutes) {
            (Some(notifier), Some(minutes)) if minutes > 0 => {
                if let Err(e) = notifier.start_timer(minutes) {
                    self.say.error(&e.to_string());
                }
            }
            _ => self.say.info(&format!(
                "It's now {}. Happy collaborating! :)",
                current_time()
            )),
        }
    }

    fn say_last_commits(&self, pair: &SessionPair) -> Result<(), MobError> {
        let range = format!("{}..{}", pair.base, pair.wip);
        let lines = self.repo.log(&range, "%h %cr <%an>")?;
        let (total, shown) = last_commits(lines);
        if total > shown.len() {
            self.say.info(&format!(
                "wip branch '{}' contains {total} commits. The last {} were:",
                pair.wip,
                shown.len()
            ));
        }
        self.say.say(&shown.join("\n"));
        Ok(())
    }

    fn open_last_modified_file_if_present(&self) {
        let Some(launcher) = self.launcher else {
            return;
        };
        if !self.config.is_open_command_given() {
            tracing::debug!("No open command given");
            return;
        }

        let message = match self.repo.last_commit_message() {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read last commit message");
                return;
            }
        };
        if !message.starts_with(&self.config.wip_commit_message) {
            tracing::debug!("Last commit isn't a wip commit");
            return;
        }

        let file = match history::last_file_from_message(&message) {
            Ok(Some(file)) => file,
            Ok(None) => return,
            Err(warning) => {
                self.say.warning(warning);
                return;
            }
        };
        let path = match self.repo.root_dir() {
            Ok(root) => root.join(&file),
            Err(e) => {
                self.say.error(&e.to_string());
                return;
            }
        };

        let path = path.to_string_lossy().to_string();
        if let Some((program, args)) = self.config.open_command_for(&path) {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            if let Err(e) = launcher.spawn(&program, &args) {
                self.say.error(&format!(
                    "Couldn't open last modified file on your system ({})",
                    std::env::consts::OS
                ));
                self.say.error(&e.to_string());
            }
            tracing::debug!(path = %path, "Opened last modified file");
        }
    }

    fn make_wip_commit(&self) -> Result<(), MobError> {
        let message = wip_commit_message(self.repo, self.config)?;
        self.repo
            .commit_all(&message, self.config.git_hooks_enabled)?;
        self.say
            .info_indented(&self.repo.changes_of_last_commit()?);
        if let Some(hash) = self.repo.head_commit_hash() {
            self.say.info_indented(&hash);
        }
        Ok(())
    }

    pub fn next(&self) -> Result<NextOutcome, MobError> {
        let (current, pair) = self.current_pair()?;
        if current != pair.wip {
            self.say_fix_start();
            return Ok(NextOutcome::NotInSession);
        }

        let uncommitted = self.repo.has_uncommitted_changes()?;
        if uncommitted
            && self.config.require_commit_message
            && !self.config.has_custom_commit_message()
        {
            return Err(MobError::precondition_with_fix(
                "commit message required",
                Fix::new(
                    "To hand over with a commit message, use",
                    self.config.mob("next --message \"<message>\""),
                ),
            ));
        }

        let outcome = if uncommitted {
            self.make_wip_commit()?;
            self.repo
                .push(self.remote(), pair.wip.name(), self.push_options())?;
            NextOutcome::Committed
        } else if pair.wip.has_local_commits(self.repo, self.config)? {
            self.repo
                .push(self.remote(), pair.wip.name(), self.push_options())?;
            NextOutcome::PushedLocalCommits
        } else {
            self.say.info("nothing was done, so nothing to commit");
            NextOutcome::NothingToCommit
        };

        self.show_next(&pair);

        if !self.config.next_stay {
            self.repo.checkout(pair.base.name(), None)?;
        }
        tracing::info!(wip = %pair.wip, outcome = ?outcome, "Handed over");
        Ok(outcome)
    }

    /// Announce who probably types next, from the authors on the wip branch.
    fn show_next(&self, pair: &SessionPair) {
        let Some(user) = self.repo.user_name() else {
            self.say.warning(
                "failed to detect who's next because you haven't set your git user name",
            );
            self.say
                .fix("To fix, use", "git config --global user.name \"Your Name Here\"");
            return;
        };

        let range = format!("{}..{}", pair.base, pair.wip);
        let committers = match self.repo.log(&range, "%an") {
            Ok(committers) => committers,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read committers");
                return;
            }
        };
        tracing::debug!(changes = committers.len(), user = %user, "Determining next typist");

        if let Some((next, previous)) = find_next_typist(&committers, &user) {
            self.say.info(&format!(
                "Committers after your last commit: {}",
                previous.join(", ")
            ));
            self.say.info(&format!("***{next}*** is (probably) next."));
        }
    }

    pub fn done(&self) -> Result<DoneOutcome, MobError> {
        let (current, pair) = self.current_pair()?;
        if current != pair.wip {
            self.say_fix_start();
            return Ok(DoneOutcome::NotInSession);
        }

        if self.config.done_squash == DoneSquash::SquashWip {
            self.squash_wip(&pair)?;
        }

        self.repo.fetch(self.remote(), true)?;
        let (_, pair) = self.current_pair()?;
        let remote_branches = self.repo.remote_branches(self.remote())?;

        if !pair.wip.has_remote_branch(&remote_branches, self.config) {
            self.repo.checkout(pair.base.name(), None)?;
            self.repo.delete_local_branch(pair.wip.name(), true)?;
            self.say.info("someone else already ended your session");
            return Ok(DoneOutcome::AlreadyEnded(pair));
        }

        let uncommitted = self.repo.has_uncommitted_changes()?;
        if uncommitted {
            self.make_wip_commit()?;
        }
        self.repo
            .push(self.remote(), pair.wip.name(), self.push_options())?;

        let coauthors = self.coauthors(&pair)?;
        let squash = self.config.done_squash == DoneSquash::Squash;

        self.repo.checkout(pair.base.name(), None)?;
        self.repo
            .merge_fast_forward_only(pair.base.remote(self.config).name())?;
        if let Err(e) = self.repo.merge_squash_or_no_commit(pair.wip.name(), squash) {
            tracing::info!(wip = %pair.wip, error = %e, "Merge into base failed");
            self.say.error(&e.to_string());
            self.say.warning(&format!(
                "Skipped deleting {} because of merge conflicts.",
                pair.wip
            ));
            self.say.warning(&format!(
                "To fix this, solve the merge conflict manually, commit, push, and afterwards delete {}",
                pair.wip
            ));
            return Ok(DoneOutcome::MergeConflict { wip: pair.wip });
        }

        self.repo.delete_local_branch(pair.wip.name(), true)?;
        if uncommitted && !squash {
            // lets the user name the final commit
            self.repo.soft_reset_last_commit()?;
        }
        self.repo.push(
            self.remote(),
            pair.wip.name(),
            PushOptions {
                delete: true,
                ..self.push_options()
            },
        )?;

        let cached = self.repo.cached_changes()?;
        if !cached.is_empty() {
            self.say.info_indented(&cached);
        }
        if squash {
            if let Err(e) = history::append_coauthors_to_squash_msg(&self.repo.git_dir()?, &coauthors) {
                self.say.error(&e.to_string());
            }
        }

        if self.repo.has_uncommitted_changes()? {
            self.say.next("To finish, use", "git commit");
        } else if squash {
            self.say.info("nothing was done, so nothing to commit");
        }

        tracing::info!(base = %pair.base, wip = %pair.wip, mode = %self.config.done_squash, "Session done");
        Ok(DoneOutcome::Merged(pair))
    }

    fn coauthors(&self, pair: &SessionPair) -> Result<Vec<String>, MobError> {
        let range = format!("{}..{}", pair.base, pair.wip);
        let authors = self.repo.log(&range, "%an <%ae>")?;
        let email = self.repo.user_email();
        Ok(history::coauthors(&authors, email.as_deref()))
    }

    /// Fold wip commits into the manual commits of the wip branch.
    pub fn squash_wip(&self, pair: &SessionPair) -> Result<(), MobError> {
        if self.repo.has_uncommitted_changes()? {
            self.make_wip_commit()?;
        }

        let editor = match &self.editor_command {
            Some(command) => command.clone(),
            None => {
                let exe = std::env::current_exe().map_err(|e| MobError::Environment {
                    message: format!("cannot locate the running executable: {e}"),
                })?;
                format!("\"{}\"", exe.display())
            }
        };

        let onto = self
            .repo
            .merge_base(pair.wip.name(), pair.base.remote(self.config).name())?;
        self.repo.rebase_interactive(
            &onto,
            &format!("{editor} squash-wip --git-sequence-editor"),
            &format!("{editor} squash-wip --git-editor"),
        )?;
        self.repo.push(
            self.remote(),
            pair.wip.name(),
            PushOptions {
                force: true,
                ..self.push_options()
            },
        )?;
        self.say.info("rewrote wip commits into the manual commits that follow them");
        Ok(())
    }

    pub fn reset(&self) -> Result<SessionPair, MobError> {
        self.repo.fetch(self.remote(), false)?;
        let (_, pair) = self.current_pair()?;

        self.repo.checkout(pair.base.name(), None)?;
        if pair.wip.exists(&self.repo.local_branches()?) {
            self.repo.delete_local_branch(pair.wip.name(), true)?;
        }
        if pair
            .wip
            .has_remote_branch(&self.repo.remote_branches(self.remote())?, self.config)
        {
            self.repo.push(
                self.remote(),
                pair.wip.name(),
                PushOptions {
                    delete: true,
                    ..self.push_options()
                },
            )?;
        }

        self.say.info(&format!(
            "Branches {} and {} deleted",
            pair.wip,
            pair.wip.remote(self.config)
        ));
        tracing::info!(wip = %pair.wip, "Session reset");
        Ok(pair)
    }

    /// Delete every local wip branch whose remote counterpart is gone.
    pub fn clean(&self) -> Result<Vec<Branch>, MobError> {
        self.repo.fetch(self.remote(), false)?;
        let current = self.repo.current_branch()?;
        let local_branches = self.repo.local_branches()?;
        let remote_branches = self.repo.remote_branches(self.remote())?;

        if current.is_orphan_wip_branch(&remote_branches, self.config) {
            let pair = determine_branches(&current, &local_branches, self.config)?;
            self.say
                .info(&format!("Current branch {current} is an orphan"));
            let target = if pair.base.exists(&local_branches) {
                pair.base
            } else if Branch::new("main").exists(&local_branches) {
                Branch::new("main")
            } else {
                Branch::new("master")
            };
            self.repo.checkout(target.name(), None)?;
        }

        let mut removed = Vec::new();
        for name in &local_branches {
            let branch = Branch::new(name);
            if branch.is_orphan_wip_branch(&remote_branches, self.config) {
                self.say
                    .info(&format!("Removing orphan wip branch {branch}"));
                self.repo.delete_local_branch(branch.name(), true)?;
                removed.push(branch);
            }
        }
        tracing::info!(removed = removed.len(), "Cleaned orphan wip branches");
        Ok(removed)
    }

    pub fn status(&self) -> Result<(), MobError> {
        let (current, pair) = self.current_pair()?;
        if current == pair.wip {
            self.say.info(&format!(
                "you are on wip branch {} (base branch {})",
                pair.wip, pair.base
            ));
            self.say_last_commits(&pair)?;
        } else {
            self.say
                .info(&format!("you are on base branch '{}'", pair.base));
            let remote_branches = self.repo.remote_branches(self.remote())?;
            let existing = wip_branches_for_base(&pair.base, &remote_branches, self.config);
            if !existing.is_empty() {
                self.say.info("remote wip branches detected:");
                for wip in existing {
                    self.say.with_prefix(&wip, "  - ");
                }
            }
        }
        Ok(())
    }

    /// Remote wip branches of any base, including the legacy session branch.
    pub fn wip_branches(&self) -> Result<Vec<String>, MobError> {
        let prefix = Branch::new(&self.config.wip_branch_prefix).remote(self.config);
        let legacy = Branch::new(crate::branch::LEGACY_WIP_BRANCH).remote(self.config);
        let branches: Vec<String> = self
            .repo
            .remote_branches(self.remote())?
            .into_iter()
            .filter(|branch| branch.starts_with(prefix.name()) || branch == legacy.name())
            .collect();
        for branch in &branches {
            self.say.say(branch);
        }
        Ok(branches)
    }

    pub fn fetch(&self) -> Result<(), MobError> {
        self.repo.fetch(self.remote(), true)?;
        Ok(())
    }
}
