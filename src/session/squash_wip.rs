//! Folding wip commits into the manual commits around them
//!
//! `done --squash-wip` runs an interactive rebase with this binary as both
//! sequence editor and commit editor. The todo list gets wip picks folded
//! into the following manual commit, trailing wip picks into the preceding
//! one. Combined messages get the wip parts commented out.

use std::path::Path;

use crate::config::MobConfig;
use crate::errors::MobError;

fn is_wip_pick(line: &str, config: &MobConfig) -> bool {
    line.starts_with("pick ") && line.trim_end().ends_with(&config.wip_commit_message)
}

fn is_pick(line: &str) -> bool {
    line.starts_with("pick ")
}

/// Rewrite a rebase todo list.
///
/// A pick directly after a wip pick becomes `squash`, or `fixup` when only
/// wip picks follow from there on, so the last manual message survives.
pub fn mark_post_wip_commits_for_squashing(todo: &str, config: &MobConfig) -> String {
    let lines: Vec<&str> = todo.split('\n').collect();
    let mut result = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let follows_wip = index > 0 && is_wip_pick(lines[index - 1], config);
        if !follows_wip || !is_pick(line) {
            result.push(line.to_string());
            continue;
        }

        let only_wip_ahead = lines[index..]
            .iter()
            .filter(|line| is_pick(line))
            .all(|line| is_wip_pick(line, config));
        let command = if only_wip_ahead { "fixup " } else { "squash " };
        result.push(line.replacen("pick ", command, 1));
    }
    result.join("\n")
}

/// Comment out every message block of a combined squash message that is a wip message.
///
/// Blocks are introduced by git's `# This is the ...commit message...:` headers.
pub fn comment_wip_commits(message: &str, config: &MobConfig) -> String {
    let wip_message = config.wip_commit_message.trim();
    let mut result: Vec<String> = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in message.split('\n') {
        if line.starts_with("# This is the") && line.trim_end().ends_with(':') {
            flush_block(&mut block, &mut result, wip_message);
        }
        block.push(line);
    }
    flush_block(&mut block, &mut result, wip_message);
    result.join("\n")
}

fn flush_block(block: &mut Vec<&str>, result: &mut Vec<String>, wip_message: &str) {
    let is_wip = block
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|first| first == wip_message);
    for line in block.drain(..) {
        if is_wip && !line.trim().is_empty() && !line.starts_with('#') {
            result.push(format!("# {line}"));
        } else {
            result.push(line.to_string());
        }
    }
}

fn rewrite_file(file: &Path, rewrite: impl FnOnce(&str) -> String) -> Result<(), MobError> {
    let to_error = |e: std::io::Error| MobError::Environment {
        message: format!("could not rewrite {}: {e}", file.display()),
    };
    let input = std::fs::read_to_string(file).map_err(to_error)?;
    std::fs::write(file, rewrite(&input)).map_err(to_error)
}

/// Entry point when invoked as `GIT_SEQUENCE_EDITOR`.
pub fn run_sequence_editor(file: &Path, config: &MobConfig) -> Result<(), MobError> {
    tracing::debug!(file = %file.display(), "Marking wip commits for squashing");
    rewrite_file(file, |todo| mark_post_wip_commits_for_squashing(todo, config))
}

/// Entry point when invoked as `GIT_EDITOR`.
pub fn run_commit_editor(file: &Path, config: &MobConfig) -> Result<(), MobError> {
    tracing::debug!(file = %file.display(), "Commenting out wip commit messages");
    rewrite_file(file, |message| comment_wip_commits(message, config))
}
