//! Commit history helpers: wip commit messages, handover hints, co-authors

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use crate::config::MobConfig;
use crate::errors::MobError;
use crate::external::GitRepository;

/// Separator between the wip message and the last modified file.
pub const LAST_FILE_TRAILER: &str = "lastFile:";

const LAST_COMMITS_SHOWN: usize = 5;

/// Paths from `git status --short` that were modified, added or are untracked.
///
/// Renames and deletions are skipped, as are untracked directories.
pub fn modified_files(status: &str) -> Vec<String> {
    status
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (code, path) = line.split_once(char::is_whitespace)?;
            let relevant = code == "??" || code.contains('M') || code.contains('A');
            let path = path.trim();
            (relevant && !code.contains('R') && !path.ends_with('/')).then(|| path.to_string())
        })
        .collect()
}

/// Most recently modified of `files`, relative to `root`.
pub fn last_modified_file(root: &Path, files: &[String]) -> Option<String> {
    if let [only] = files {
        return Some(only.clone());
    }

    let mut newest: Option<(SystemTime, &String)> = None;
    for file in files {
        let modified = match std::fs::metadata(root.join(file)).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::debug!(file = %file, error = %e, "Could not stat modified file");
                continue;
            }
        };
        if newest.map_or(true, |(time, _)| modified > time) {
            newest = Some((modified, file));
        }
    }
    newest.map(|(_, file)| file.clone())
}

/// Commit message for the next wip commit, with the `lastFile:` trailer when known.
pub fn wip_commit_message(repo: &dyn GitRepository, config: &MobConfig) -> Result<String, MobError> {
    let mut message = config.commit_message().to_string();
    let files = modified_files(&repo.status_short()?);
    let root = repo.root_dir()?;
    if let Some(file) = last_modified_file(&root, &files) {
        message.push_str(&format!("\n\n{LAST_FILE_TRAILER}{file}"));
    }
    Ok(message)
}

/// File named by the trailer, `Err` with a warning text when it is ambiguous.
pub fn last_file_from_message(message: &str) -> Result<Option<String>, &'static str> {
    let parts: Vec<&str> = message.split(LAST_FILE_TRAILER).collect();
    match parts.as_slice() {
        [_] => Err("Couldn't find last modified file in commit message!"),
        [_, file] => {
            let file = file.trim();
            Ok((!file.is_empty()).then(|| file.to_string()))
        }
        _ => Err(
            "Could not determine last modified file from commit message, separator was used multiple times!",
        ),
    }
}

/// Reference of the first stash whose description mentions `stash_name`.
pub fn find_stash_by_name(stashes: &str, stash_name: &str) -> Option<String> {
    stashes
        .lines()
        .find(|line| line.contains(stash_name))
        .and_then(|line| line.split_once(':'))
        .map(|(reference, _)| reference.to_string())
}

/// Up to five of the newest log entries, oldest first, and the total count.
pub fn last_commits(mut lines: Vec<String>) -> (usize, Vec<String>) {
    let total = lines.len();
    lines.truncate(LAST_COMMITS_SHOWN);
    lines.reverse();
    (total, lines)
}

/// Who typed before `user` last time, given commit authors newest first.
///
/// Returns the next typist and the recent committers that lead to the guess.
pub fn find_next_typist(committers: &[String], user: &str) -> Option<(String, Vec<String>)> {
    committers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, committer)| committer.as_str() == user)
        .find_map(|(index, _)| {
            let candidate = &committers[index - 1];
            if candidate == user {
                return None;
            }
            let history = (2 * index + 1).min(committers.len()).min(LAST_COMMITS_SHOWN);
            Some((candidate.clone(), committers[..history].to_vec()))
        })
}

/// Distinct `Name <email>` authors other than `own_email`, in first-seen order.
pub fn coauthors(authors: &[String], own_email: Option<&str>) -> Vec<String> {
    let own = own_email.map(|email| format!("<{}>", email.to_lowercase()));
    let mut result: Vec<String> = Vec::new();
    for author in authors {
        let is_own = own
            .as_deref()
            .is_some_and(|own| author.to_lowercase().ends_with(own));
        if !is_own && !result.contains(author) {
            result.push(author.clone());
        }
    }
    result
}

/// Append `Co-authored-by` trailers to the pending squash message, if there is one.
pub fn append_coauthors_to_squash_msg(git_dir: &Path, coauthors: &[String]) -> Result<(), MobError> {
    let squash_msg = git_dir.join("SQUASH_MSG");
    if coauthors.is_empty() || !squash_msg.is_file() {
        return Ok(());
    }

    let mut trailers = String::from("\n");
    for coauthor in coauthors {
        trailers.push_str(&format!("Co-authored-by: {coauthor}\n"));
    }

    OpenOptions::new()
        .append(true)
        .open(&squash_msg)
        .and_then(|mut file| file.write_all(trailers.as_bytes()))
        .map_err(|e| MobError::Environment {
            message: format!("could not write {}: {e}", squash_msg.display()),
        })
}
