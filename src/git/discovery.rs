use git2::Repository;
use std::path::{Path, PathBuf};

use crate::errors::MobError;

/// Where the enclosing repository keeps its work tree and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    pub root: PathBuf,
    pub git_dir: PathBuf,
}

impl RepositoryLocation {
    /// Project configuration file at the repository root.
    pub fn project_config_path(&self) -> PathBuf {
        self.root.join(".mob")
    }
}

/// Find the repository containing `path`, searching parent directories.
pub fn discover_repository(path: &Path) -> Result<RepositoryLocation, MobError> {
    let repo = Repository::discover(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "No git repository found");
        MobError::Environment {
            message: "expecting the current working directory to be a git repository.".to_string(),
        }
    })?;

    let root = repo.workdir().ok_or_else(|| MobError::Environment {
        message: "bare repositories have no working tree to hand over".to_string(),
    })?;

    let location = RepositoryLocation {
        root: root.to_path_buf(),
        git_dir: repo.path().to_path_buf(),
    };
    tracing::debug!(root = %location.root.display(), git_dir = %location.git_dir.display(), "Discovered repository");
    Ok(location)
}
