//! Branch values and the wip naming engine
//!
//! All session state is encoded in branch names. This module knows how to
//! derive a wip branch name from a base branch name and back again, across the
//! three naming eras: the legacy `mob-session` literal, `<prefix><base>` and
//! `<prefix><base><separator><qualifier>`.

use std::fmt;

use crate::config::MobConfig;
use crate::external::{GitError, GitRepository};

/// Legacy wip branch used before prefixes existed.
pub const LEGACY_WIP_BRANCH: &str = "mob-session";
/// Base branch paired with [`LEGACY_WIP_BRANCH`].
pub const LEGACY_BASE_BRANCH: &str = "master";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Branch {
    name: String,
}

impl Branch {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// `<remote>/<name>`, the remote-tracking name of this branch.
    pub fn remote(&self, config: &MobConfig) -> Branch {
        Branch::new(format!("{}/{}", config.remote_name, self.name))
    }

    pub fn is_wip_branch(&self, config: &MobConfig) -> bool {
        self.name == LEGACY_WIP_BRANCH || self.name.starts_with(&config.wip_branch_prefix)
    }

    pub fn add_wip_prefix(&self, config: &MobConfig) -> Branch {
        Branch::new(format!("{}{}", config.wip_branch_prefix, self.name))
    }

    pub fn remove_wip_prefix(&self, config: &MobConfig) -> Branch {
        match self.name.strip_prefix(&config.wip_branch_prefix) {
            Some(rest) => Branch::new(rest),
            None => self.clone(),
        }
    }

    pub fn add_wip_qualifier(&self, config: &MobConfig) -> Branch {
        if !config.custom_wip_branch_qualifier_configured() {
            return self.clone();
        }
        // A bare prefix (fixed base branch plus qualifier) gets the raw qualifier.
        if self.name == config.wip_branch_prefix {
            return Branch::new(format!("{}{}", self.name, config.wip_branch_qualifier));
        }
        Branch::new(format!("{}{}", self.name, config.wip_branch_qualifier_suffix()))
    }

    /// Strips qualifier segments until the name denotes an existing local
    /// branch or no separator is left.
    ///
    /// Every productive step removes at least one character, and a step that
    /// changes nothing ends the loop, so the number of iterations never
    /// exceeds the length of the name.
    pub fn remove_wip_qualifier(&self, local_branches: &[String], config: &MobConfig) -> Branch {
        let separator = config.wip_branch_qualifier_separator.as_str();
        let mut current = self.clone();
        let max_iterations = current.name.len();

        for _ in 0..max_iterations {
            if current.exists(local_branches) || !current.name.contains(separator) {
                break;
            }
            let candidate = current.remove_wip_qualifier_suffix_or_separator(config);
            if candidate == current {
                break;
            }
            current = candidate;
        }
        current
    }

    fn remove_wip_qualifier_suffix_or_separator(&self, config: &MobConfig) -> Branch {
        if config.custom_wip_branch_qualifier_configured() {
            self.remove_wip_qualifier_suffix(config)
        } else {
            self.remove_from_separator(&config.wip_branch_qualifier_separator)
        }
    }

    fn remove_from_separator(&self, separator: &str) -> Branch {
        match self.name.rfind(separator) {
            Some(index) if !separator.is_empty() => Branch::new(&self.name[..index]),
            _ => self.clone(),
        }
    }

    fn remove_wip_qualifier_suffix(&self, config: &MobConfig) -> Branch {
        let suffix = config.wip_branch_qualifier_suffix();
        match self.name.strip_suffix(&suffix) {
            Some(rest) => Branch::new(rest),
            None => self.clone(),
        }
    }

    pub fn exists(&self, branches: &[String]) -> bool {
        branches.iter().any(|branch| branch == &self.name)
    }

    /// True when `<remote>/<name>` is part of the remote branch snapshot.
    pub fn has_remote_branch(&self, remote_branches: &[String], config: &MobConfig) -> bool {
        self.remote(config).exists(remote_branches)
    }

    pub fn is_orphan_wip_branch(&self, remote_branches: &[String], config: &MobConfig) -> bool {
        self.is_wip_branch(config) && !self.has_remote_branch(remote_branches, config)
    }

    /// Local tip differs from the remote-tracking tip.
    pub fn has_local_commits(
        &self,
        repo: &dyn GitRepository,
        config: &MobConfig,
    ) -> Result<bool, GitError> {
        let local = repo.object_id(&format!("refs/heads/{}", self.name))?;
        let remote = repo.object_id(&format!("refs/remotes/{}", self.remote(config).name))?;
        Ok(local != remote)
    }

    /// Number of commits reachable only from the local branch.
    pub fn unpushed_commits(
        &self,
        repo: &dyn GitRepository,
        config: &MobConfig,
    ) -> Result<u32, GitError> {
        let local = repo.object_id(&format!("refs/heads/{}", self.name))?;
        let remote = repo.object_id(&format!("refs/remotes/{}", self.remote(config).name))?;
        if local == remote {
            return Ok(0);
        }
        repo.count_commits_only_in(
            &format!("refs/heads/{}", self.name),
            &format!("refs/remotes/{}", self.remote(config).name),
        )
    }

    pub fn has_unpushed_commits(
        &self,
        repo: &dyn GitRepository,
        config: &MobConfig,
    ) -> Result<bool, GitError> {
        Ok(self.unpushed_commits(repo, config)? != 0)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Branch {
    fn from(name: &str) -> Self {
        Branch::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(prefix: &str, qualifier: &str, separator: &str) -> MobConfig {
        MobConfig {
            wip_branch_prefix: prefix.to_string(),
            wip_branch_qualifier: qualifier.to_string(),
            wip_branch_qualifier_separator: separator.to_string(),
            ..MobConfig::default()
        }
    }

    fn branches(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_new_trims_whitespace() {
        assert_eq!(Branch::new("  main\n").name(), "main");
    }

    #[test]
    fn test_remote_prepends_remote_name() {
        let config = MobConfig::default();
        assert_eq!(Branch::new("mob/main").remote(&config).name(), "origin/mob/main");
    }

    #[test]
    fn test_is_wip_branch() {
        let config = config_with("mob/", "", "-");
        assert!(Branch::new("mob/main").is_wip_branch(&config));
        assert!(Branch::new("mob-session").is_wip_branch(&config));
        assert!(!Branch::new("main").is_wip_branch(&config));
        assert!(!Branch::new("feature/mob/main").is_wip_branch(&config));
    }

    #[test]
    fn test_prefix_round_trip() {
        let config = config_with("mob/", "", "-");
        let branch = Branch::new("feature-1");
        let wip = branch.add_wip_prefix(&config);
        assert_eq!(wip.name(), "mob/feature-1");
        assert_eq!(wip.remove_wip_prefix(&config), branch);
    }

    #[test]
    fn test_remove_wip_prefix_without_prefix_is_identity() {
        let config = config_with("mob/", "", "-");
        assert_eq!(Branch::new("main").remove_wip_prefix(&config).name(), "main");
    }

    #[test]
    fn test_add_wip_qualifier() {
        let config = config_with("mob/", "alice", "-");
        assert_eq!(
            Branch::new("mob/main").add_wip_qualifier(&config).name(),
            "mob/main-alice"
        );
        assert_eq!(Branch::new("mob/").add_wip_qualifier(&config).name(), "mob/alice");

        let unqualified = config_with("mob/", "", "-");
        assert_eq!(
            Branch::new("mob/main").add_wip_qualifier(&unqualified).name(),
            "mob/main"
        );
    }

    #[test]
    fn test_remove_wip_qualifier_stops_at_existing_branch() {
        let config = config_with("mob/", "", "-");
        let local = branches(&["feature-1", "main"]);
        assert_eq!(
            Branch::new("feature-1-green")
                .remove_wip_qualifier(&local, &config)
                .name(),
            "feature-1"
        );
    }

    #[test]
    fn test_remove_wip_qualifier_strips_several_segments() {
        let config = config_with("mob/", "", "-");
        let local = branches(&["main"]);
        assert_eq!(
            Branch::new("main-green-blue")
                .remove_wip_qualifier(&local, &config)
                .name(),
            "main"
        );
    }

    #[test]
    fn test_remove_wip_qualifier_with_configured_qualifier() {
        let config = config_with("mob/", "green", "-");
        let local = branches(&["main"]);
        assert_eq!(
            Branch::new("main-green").remove_wip_qualifier(&local, &config).name(),
            "main"
        );
        // a foreign qualifier cannot be stripped and must not loop
        assert_eq!(
            Branch::new("main-red").remove_wip_qualifier(&local, &config).name(),
            "main-red"
        );
    }

    #[test]
    fn test_remove_wip_qualifier_separator_absent() {
        let config = config_with("mob/", "", "/");
        assert_eq!(
            Branch::new("main-green").remove_wip_qualifier(&[], &config).name(),
            "main-green"
        );
    }

    #[test]
    fn test_remove_wip_qualifier_only_separators_terminates() {
        let config = config_with("mob/", "", "-");
        assert_eq!(Branch::new("----").remove_wip_qualifier(&[], &config).name(), "");
    }

    #[test]
    fn test_remove_wip_qualifier_empty_separator_terminates() {
        let config = config_with("mob/", "", "");
        assert_eq!(
            Branch::new("main").remove_wip_qualifier(&[], &config).name(),
            "main"
        );
    }

    #[test]
    fn test_orphan_detection() {
        let config = config_with("mob/", "", "-");
        let remote = branches(&["origin/main", "origin/mob/main-alice"]);
        assert!(!Branch::new("mob/main-alice").is_orphan_wip_branch(&remote, &config));
        assert!(Branch::new("mob/main-bob").is_orphan_wip_branch(&remote, &config));
        assert!(!Branch::new("feature").is_orphan_wip_branch(&remote, &config));
    }
}
