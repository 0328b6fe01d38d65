// In-memory repository for lifecycle tests - no side effects

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::branch::Branch;
use crate::external::{CommandError, CommandExecutor, CommandOutput, GitError, GitRepository, PushOptions};

/// Repository-changing calls, in the order the controller issued them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCommand {
    Fetch { prune: bool },
    Checkout { branch: String, create_from: Option<String> },
    SetUpstream { branch: String, upstream: String },
    Push { branch: String, options: PushOptions },
    DeleteLocalBranch { branch: String, force: bool },
    CommitAll { message: String },
    MergeFastForwardOnly { reference: String },
    MergeSquashOrNoCommit { reference: String, squash: bool },
    StashPush { message: String },
    StashPop { stash: String },
    SoftResetLastCommit,
    RebaseInteractive { onto: String },
}

/// Mock repository keeping branches, refs and working tree state in memory
#[derive(Debug)]
pub struct MockGitRepository {
    pub remote_name: String,
    pub current_branch: RefCell<String>,
    pub local_branches: RefCell<Vec<String>>,
    pub remote_branches: RefCell<Vec<String>>,
    pub object_ids: RefCell<HashMap<String, String>>,
    pub unpushed: RefCell<HashMap<String, u32>>,
    pub uncommitted: RefCell<bool>,
    pub merge_conflict: RefCell<bool>,
    pub tracked_in_working_dir: RefCell<String>,
    pub logs: RefCell<HashMap<String, Vec<String>>>,
    pub last_commit_message: RefCell<String>,
    pub user_name: RefCell<Option<String>>,
    pub user_email: RefCell<Option<String>>,
    pub stashes: RefCell<String>,
    commit_counter: RefCell<u32>,
    pub executed_commands: RefCell<Vec<GitCommand>>,
}

impl Default for MockGitRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitRepository {
    /// Clean checkout of `main`, pushed to `origin/main`.
    pub fn new() -> Self {
        let repo = Self {
            remote_name: "origin".to_string(),
            current_branch: RefCell::new("main".to_string()),
            local_branches: RefCell::new(Vec::new()),
            remote_branches: RefCell::new(Vec::new()),
            object_ids: RefCell::new(HashMap::new()),
            unpushed: RefCell::new(HashMap::new()),
            uncommitted: RefCell::new(false),
            merge_conflict: RefCell::new(false),
            tracked_in_working_dir: RefCell::new("README.md".to_string()),
            logs: RefCell::new(HashMap::new()),
            last_commit_message: RefCell::new("initial commit".to_string()),
            user_name: RefCell::new(Some("alice".to_string())),
            user_email: RefCell::new(Some("alice@example.com".to_string())),
            stashes: RefCell::new(String::new()),
            commit_counter: RefCell::new(0),
            executed_commands: RefCell::new(Vec::new()),
        };
        repo.add_local_branch("main", "c0");
        repo.add_remote_branch("main", "c0");
        repo
    }

    pub fn set_current_branch(&self, branch: &str) {
        *self.current_branch.borrow_mut() = branch.to_string();
    }

    pub fn add_local_branch(&self, branch: &str, id: &str) {
        let mut locals = self.local_branches.borrow_mut();
        if !locals.iter().any(|existing| existing == branch) {
            locals.push(branch.to_string());
        }
        self.object_ids
            .borrow_mut()
            .insert(format!("refs/heads/{branch}"), id.to_string());
    }

    pub fn add_remote_branch(&self, branch: &str, id: &str) {
        let remote = format!("{}/{branch}", self.remote_name);
        let mut remotes = self.remote_branches.borrow_mut();
        if !remotes.contains(&remote) {
            remotes.push(remote.clone());
        }
        self.object_ids
            .borrow_mut()
            .insert(format!("refs/remotes/{remote}"), id.to_string());
    }

    pub fn remove_remote_branch(&self, branch: &str) {
        let remote = format!("{}/{branch}", self.remote_name);
        self.remote_branches.borrow_mut().retain(|existing| existing != &remote);
        self.object_ids
            .borrow_mut()
            .remove(&format!("refs/remotes/{remote}"));
    }

    pub fn set_uncommitted(&self, uncommitted: bool) {
        *self.uncommitted.borrow_mut() = uncommitted;
    }

    pub fn set_merge_conflict(&self, conflict: bool) {
        *self.merge_conflict.borrow_mut() = conflict;
    }

    pub fn set_unpushed(&self, branch: &str, count: u32) {
        self.unpushed
            .borrow_mut()
            .insert(format!("refs/heads/{branch}"), count);
    }

    pub fn set_log(&self, format: &str, entries: &[&str]) {
        self.logs.borrow_mut().insert(
            format.to_string(),
            entries.iter().map(|entry| entry.to_string()).collect(),
        );
    }

    pub fn has_local(&self, branch: &str) -> bool {
        self.local_branches.borrow().iter().any(|b| b == branch)
    }

    pub fn has_remote(&self, branch: &str) -> bool {
        let remote = format!("{}/{branch}", self.remote_name);
        self.remote_branches.borrow().contains(&remote)
    }

    pub fn get_executed_commands(&self) -> Vec<GitCommand> {
        self.executed_commands.borrow().clone()
    }

    pub fn clear_executed_commands(&self) {
        self.executed_commands.borrow_mut().clear();
    }

    fn record(&self, command: GitCommand) {
        self.executed_commands.borrow_mut().push(command);
    }

    fn local_id(&self, branch: &str) -> Option<String> {
        self.object_ids
            .borrow()
            .get(&format!("refs/heads/{branch}"))
            .cloned()
    }

    fn resolve_id(&self, reference: &str) -> String {
        let ids = self.object_ids.borrow();
        ids.get(&format!("refs/remotes/{reference}"))
            .or_else(|| ids.get(&format!("refs/heads/{reference}")))
            .cloned()
            .unwrap_or_else(|| "c0".to_string())
    }
}

impl GitRepository for MockGitRepository {
    fn current_branch(&self) -> Result<Branch, GitError> {
        Ok(Branch::new(self.current_branch.borrow().as_str()))
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        Ok(self.local_branches.borrow().clone())
    }

    fn remote_branches(&self, remote: &str) -> Result<Vec<String>, GitError> {
        let prefix = format!("{remote}/");
        Ok(self
            .remote_branches
            .borrow()
            .iter()
            .filter(|branch| branch.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn object_id(&self, reference: &str) -> Result<Option<String>, GitError> {
        Ok(self.object_ids.borrow().get(reference).cloned())
    }

    fn count_commits_only_in(&self, reference: &str, _not_in: &str) -> Result<u32, GitError> {
        Ok(self.unpushed.borrow().get(reference).copied().unwrap_or(1))
    }

    fn fetch(&self, _remote: &str, prune: bool) -> Result<(), GitError> {
        self.record(GitCommand::Fetch { prune });
        Ok(())
    }

    fn checkout(&self, branch: &str, create_from: Option<&str>) -> Result<(), GitError> {
        self.record(GitCommand::Checkout {
            branch: branch.to_string(),
            create_from: create_from.map(str::to_string),
        });
        match create_from {
            Some(start_point) => {
                let id = self.resolve_id(start_point);
                self.add_local_branch(branch, &id);
            }
            None if !self.has_local(branch) => {
                return Err(GitError::CommandFailed {
                    command: format!("git checkout {branch}"),
                    output: format!("error: pathspec '{branch}' did not match any file(s) known to git"),
                    message: "exit status: 1".to_string(),
                });
            }
            None => {}
        }
        self.set_current_branch(branch);
        Ok(())
    }

    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<(), GitError> {
        self.record(GitCommand::SetUpstream {
            branch: branch.to_string(),
            upstream: upstream.to_string(),
        });
        Ok(())
    }

    fn push(&self, _remote: &str, branch: &str, options: PushOptions) -> Result<(), GitError> {
        self.record(GitCommand::Push {
            branch: branch.to_string(),
            options,
        });
        if options.delete {
            self.remove_remote_branch(branch);
        } else {
            let id = self.local_id(branch).unwrap_or_else(|| "c0".to_string());
            self.add_remote_branch(branch, &id);
        }
        Ok(())
    }

    fn delete_local_branch(&self, branch: &str, force: bool) -> Result<(), GitError> {
        self.record(GitCommand::DeleteLocalBranch {
            branch: branch.to_string(),
            force,
        });
        self.local_branches.borrow_mut().retain(|b| b != branch);
        self.object_ids
            .borrow_mut()
            .remove(&format!("refs/heads/{branch}"));
        Ok(())
    }

    fn commit_all(&self, message: &str, _hooks_enabled: bool) -> Result<(), GitError> {
        self.record(GitCommand::CommitAll {
            message: message.to_string(),
        });
        let id = {
            let mut counter = self.commit_counter.borrow_mut();
            *counter += 1;
            format!("w{counter}")
        };
        let current = self.current_branch.borrow().clone();
        self.add_local_branch(&current, &id);
        *self.last_commit_message.borrow_mut() = message.to_string();
        self.set_uncommitted(false);
        Ok(())
    }

    fn merge_fast_forward_only(&self, reference: &str) -> Result<(), GitError> {
        self.record(GitCommand::MergeFastForwardOnly {
            reference: reference.to_string(),
        });
        Ok(())
    }

    fn merge_squash_or_no_commit(&self, reference: &str, squash: bool) -> Result<(), GitError> {
        self.record(GitCommand::MergeSquashOrNoCommit {
            reference: reference.to_string(),
            squash,
        });
        if *self.merge_conflict.borrow() {
            self.set_uncommitted(true);
            return Err(GitError::CommandFailed {
                command: format!("git merge --squash --ff {reference}"),
                output: "CONFLICT (content): Merge conflict in file.txt".to_string(),
                message: "exit status: 1".to_string(),
            });
        }
        self.set_uncommitted(squash);
        Ok(())
    }

    fn stash_push(&self, message: &str) -> Result<(), GitError> {
        self.record(GitCommand::StashPush {
            message: message.to_string(),
        });
        *self.stashes.borrow_mut() = format!("stash@{{0}}: On main: {message}");
        self.set_uncommitted(false);
        Ok(())
    }

    fn stash_list(&self) -> Result<String, GitError> {
        Ok(self.stashes.borrow().clone())
    }

    fn stash_pop(&self, stash: &str) -> Result<(), GitError> {
        self.record(GitCommand::StashPop {
            stash: stash.to_string(),
        });
        self.stashes.borrow_mut().clear();
        self.set_uncommitted(true);
        Ok(())
    }

    fn soft_reset_last_commit(&self) -> Result<(), GitError> {
        self.record(GitCommand::SoftResetLastCommit);
        self.set_uncommitted(true);
        Ok(())
    }

    fn status_short(&self) -> Result<String, GitError> {
        Ok(if *self.uncommitted.borrow() {
            "M  file.txt".to_string()
        } else {
            String::new()
        })
    }

    fn untracked_files(&self) -> Result<String, GitError> {
        Ok(String::new())
    }

    fn unstaged_changes(&self) -> Result<String, GitError> {
        Ok(if *self.uncommitted.borrow() {
            " file.txt | 1 +".to_string()
        } else {
            String::new()
        })
    }

    fn cached_changes(&self) -> Result<String, GitError> {
        self.unstaged_changes()
    }

    fn changes_of_last_commit(&self) -> Result<String, GitError> {
        Ok(" file.txt | 1 +".to_string())
    }

    fn tracked_files_in_working_dir(&self) -> Result<String, GitError> {
        Ok(self.tracked_in_working_dir.borrow().clone())
    }

    fn head_commit_hash(&self) -> Option<String> {
        let current = self.current_branch.borrow().clone();
        self.local_id(&current)
    }

    fn log(&self, _range: &str, format: &str) -> Result<Vec<String>, GitError> {
        Ok(self.logs.borrow().get(format).cloned().unwrap_or_default())
    }

    fn last_commit_message(&self) -> Result<String, GitError> {
        Ok(self.last_commit_message.borrow().clone())
    }

    fn user_name(&self) -> Option<String> {
        self.user_name.borrow().clone()
    }

    fn user_email(&self) -> Option<String> {
        self.user_email.borrow().clone()
    }

    fn git_dir(&self) -> Result<PathBuf, GitError> {
        Ok(PathBuf::from("/nonexistent/repository/.git"))
    }

    fn root_dir(&self) -> Result<PathBuf, GitError> {
        Ok(PathBuf::from("/nonexistent/repository"))
    }

    fn merge_base(&self, _first: &str, second: &str) -> Result<String, GitError> {
        Ok(self.resolve_id(second))
    }

    fn rebase_interactive(
        &self,
        onto: &str,
        _sequence_editor: &str,
        _editor: &str,
    ) -> Result<(), GitError> {
        self.record(GitCommand::RebaseInteractive {
            onto: onto.to_string(),
        });
        Ok(())
    }
}

/// Records spawned processes instead of starting them
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub spawned: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingLauncher {
    pub fn spawned(&self) -> Vec<(String, Vec<String>)> {
        self.spawned.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CommandExecutor for RecordingLauncher {
    fn execute(
        &self,
        program: &str,
        _args: &[&str],
        _env: &[(&str, &str)],
    ) -> Result<CommandOutput, CommandError> {
        Err(CommandError::CommandNotFound {
            command: program.to_string(),
        })
    }

    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CommandError> {
        if let Ok(mut spawned) = self.spawned.lock() {
            spawned.push((
                program.to_string(),
                args.iter().map(|arg| arg.to_string()).collect(),
            ));
        }
        Ok(())
    }
}
