//! Sandboxed repositories for end-to-end tests
//!
//! Every sandbox owns a bare `origin` seeded with one commit on `main`, and
//! hands out clones whose git identity is set per repository. `HOME` points
//! into the sandbox so neither `~/.gitconfig` nor `~/.mob` leak in.
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;

pub struct GitSandbox {
    root: TempDir,
    pub remote: PathBuf,
    pub home: PathBuf,
}

impl GitSandbox {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let remote = root.path().join("origin.git");
        let home = root.path().join("home");
        fs::create_dir_all(&home).unwrap();

        let sandbox = Self { root, remote, home };
        sandbox.git(
            sandbox.root.path(),
            &["init", "--bare", sandbox.remote.to_str().unwrap()],
        );
        sandbox.git(&sandbox.remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let seed = sandbox.clone_as("seed");
        fs::write(seed.join("README.md"), "# shared project\n").unwrap();
        sandbox.git(&seed, &["add", "README.md"]);
        sandbox.git(&seed, &["commit", "-m", "Initial commit"]);
        sandbox.git(&seed, &["push", "origin", "main"]);
        sandbox
    }

    /// Fresh clone of `origin` committing as `name <name@example.com>`.
    pub fn clone_as(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join(name);
        self.git(
            self.root.path(),
            &["clone", self.remote.to_str().unwrap(), dir.to_str().unwrap()],
        );
        self.git(&dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        self.git(&dir, &["config", "user.name", name]);
        self.git(&dir, &["config", "user.email", &format!("{name}@example.com")]);
        self.git(&dir, &["config", "commit.gpgsign", "false"]);
        dir
    }

    /// Run git in `dir`, asserting success, and return trimmed stdout.
    pub fn git(&self, dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .env("HOME", &self.home)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// The `mob` binary, ready to run in `dir`.
    pub fn mob(&self, dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("mob").unwrap();
        cmd.current_dir(dir)
            .env("HOME", &self.home)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("MOB_TIMER_LOCAL", "false")
            .env_remove("MOB_LOG");
        cmd
    }

    pub fn current_branch(&self, dir: &Path) -> String {
        self.git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn local_branches(&self, dir: &Path) -> Vec<String> {
        self.git(dir, &["branch", "--format=%(refname:short)"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn remote_has_branch(&self, branch: &str) -> bool {
        !self
            .git(&self.remote, &["branch", "--list", branch])
            .is_empty()
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}
