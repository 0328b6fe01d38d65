use config::{Config, ConfigError, Environment, Map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::MobError;

/// How `done` folds the wip branch back into the base branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum DoneSquash {
    /// Single commit, the user finalizes the message
    #[default]
    Squash,
    /// Plain merge, all commits preserved
    NoSquash,
    /// Squash only the generated wip commits, keep manual commits
    SquashWip,
}

impl DoneSquash {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoneSquash::Squash => "squash",
            DoneSquash::NoSquash => "no-squash",
            DoneSquash::SquashWip => "squash-wip",
        }
    }
}

impl fmt::Display for DoneSquash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for DoneSquash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for DoneSquash {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "squash" | "true" => Ok(DoneSquash::Squash),
            "no-squash" | "false" => Ok(DoneSquash::NoSquash),
            "squash-wip" => Ok(DoneSquash::SquashWip),
            other => Err(format!(
                "unknown done squash mode '{other}' (expected squash, no-squash or squash-wip)"
            )),
        }
    }
}

/// Effective configuration for one invocation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MobConfig {
    pub cli_name: String,
    pub remote_name: String,
    pub wip_commit_message: String,
    pub git_hooks_enabled: bool,
    pub require_commit_message: bool,
    pub voice_command: String,
    pub voice_message: String,
    pub notify_command: String,
    pub notify_message: String,
    pub next_stay: bool,
    pub start_include_uncommitted_changes: bool,
    pub stash_name: String,
    pub wip_branch_qualifier: String,
    pub wip_branch_qualifier_separator: String,
    pub wip_branch_prefix: String,
    pub fixed_base_branch: String,
    pub done_squash: DoneSquash,
    pub open_command: String,
    pub timer: String,
    pub timer_local: bool,
    /// Set from `next --message`, never read from files
    #[serde(skip)]
    pub custom_commit_message: Option<String>,
}

impl Default for MobConfig {
    fn default() -> Self {
        Self {
            cli_name: "mob".to_string(),
            remote_name: "origin".to_string(),
            wip_commit_message: "mob next [ci-skip] [ci skip] [skip ci]".to_string(),
            git_hooks_enabled: false,
            require_commit_message: false,
            voice_command: default_voice_command().to_string(),
            voice_message: "mob next".to_string(),
            notify_command: default_notify_command().to_string(),
            notify_message: "mob next".to_string(),
            next_stay: true,
            start_include_uncommitted_changes: false,
            stash_name: "mob-stash-name".to_string(),
            wip_branch_qualifier: String::new(),
            wip_branch_qualifier_separator: "-".to_string(),
            wip_branch_prefix: "mob/".to_string(),
            fixed_base_branch: String::new(),
            done_squash: DoneSquash::Squash,
            open_command: String::new(),
            timer: String::new(),
            timer_local: true,
            custom_commit_message: None,
        }
    }
}

fn default_voice_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "(New-Object -ComObject SAPI.SPVoice).Speak(\\\"%s\\\")"
    } else {
        "say \"%s\""
    }
}

fn default_notify_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "/usr/bin/osascript -e 'display notification \"%s\"'"
    } else if cfg!(target_os = "windows") {
        ""
    } else {
        "notify-send \"%s\""
    }
}

impl MobConfig {
    pub fn custom_wip_branch_qualifier_configured(&self) -> bool {
        !self.wip_branch_qualifier.is_empty()
    }

    pub fn custom_fixed_base_branch_configured(&self) -> bool {
        !self.fixed_base_branch.is_empty()
    }

    pub fn wip_branch_qualifier_suffix(&self) -> String {
        format!(
            "{}{}",
            self.wip_branch_qualifier_separator, self.wip_branch_qualifier
        )
    }

    pub fn has_custom_commit_message(&self) -> bool {
        self.custom_commit_message
            .as_deref()
            .is_some_and(|message| !message.trim().is_empty())
    }

    /// Message for the next wip commit, honoring `next --message`.
    pub fn commit_message(&self) -> &str {
        match &self.custom_commit_message {
            Some(message) if !message.trim().is_empty() => message,
            _ => &self.wip_commit_message,
        }
    }

    pub fn is_open_command_given(&self) -> bool {
        !self.open_command.trim().is_empty()
    }

    /// Program and arguments that open `path` with the configured open command.
    pub fn open_command_for(&self, path: &str) -> Option<(String, Vec<String>)> {
        let command = self.open_command.replace("%s", path);
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        let mut args: Vec<String> = parts.collect();
        if !self.open_command.contains("%s") {
            args.push(path.to_string());
        }
        Some((program, args))
    }

    /// `<cli name> <arguments>`, used in remedy hints.
    pub fn mob(&self, arguments: &str) -> String {
        format!("{} {}", self.cli_name, arguments)
    }

    /// Load configuration with precedence (lowest first):
    /// 1. Default values
    /// 2. User file `~/.mob`
    /// 3. Project file `<repository root>/.mob`
    /// 4. Environment variables prefixed with `MOB_`
    pub fn load(user_file: Option<&Path>, project_file: Option<&Path>) -> Result<Self, MobError> {
        let mut builder = Config::builder();

        for file in [user_file, project_file].into_iter().flatten() {
            if file.is_file() {
                tracing::debug!(path = %file.display(), "Reading mob configuration file");
                builder = builder.add_source(mob_environment(Some(read_mob_file(file)?)));
            }
        }

        builder = builder.add_source(mob_environment(None));

        let config = builder.build()?;
        let mob_config: MobConfig = config.try_deserialize()?;
        if mob_config.wip_branch_prefix.trim().is_empty() {
            return Err(MobError::Config(ConfigError::Message(
                "MOB_WIP_BRANCH_PREFIX must not be empty".to_string(),
            )));
        }
        Ok(mob_config)
    }

    /// Lines in the `MOB_KEY="value"` format also accepted by `.mob` files.
    pub fn to_assignments(&self) -> Vec<String> {
        vec![
            assignment("CLI_NAME", &self.cli_name),
            assignment("REMOTE_NAME", &self.remote_name),
            assignment("WIP_COMMIT_MESSAGE", &self.wip_commit_message),
            assignment("GIT_HOOKS_ENABLED", &self.git_hooks_enabled),
            assignment("REQUIRE_COMMIT_MESSAGE", &self.require_commit_message),
            assignment("VOICE_COMMAND", &self.voice_command),
            assignment("VOICE_MESSAGE", &self.voice_message),
            assignment("NOTIFY_COMMAND", &self.notify_command),
            assignment("NOTIFY_MESSAGE", &self.notify_message),
            assignment("NEXT_STAY", &self.next_stay),
            assignment(
                "START_INCLUDE_UNCOMMITTED_CHANGES",
                &self.start_include_uncommitted_changes,
            ),
            assignment("STASH_NAME", &self.stash_name),
            assignment("WIP_BRANCH_QUALIFIER", &self.wip_branch_qualifier),
            assignment(
                "WIP_BRANCH_QUALIFIER_SEPARATOR",
                &self.wip_branch_qualifier_separator,
            ),
            assignment("WIP_BRANCH_PREFIX", &self.wip_branch_prefix),
            assignment("FIXED_BASE_BRANCH", &self.fixed_base_branch),
            assignment("DONE_SQUASH", &self.done_squash),
            assignment("OPEN_COMMAND", &self.open_command),
            assignment("TIMER", &self.timer),
            assignment("TIMER_LOCAL", &self.timer_local),
        ]
    }
}

fn assignment(key: &str, value: &dyn fmt::Display) -> String {
    format!("MOB_{key}=\"{value}\"")
}

fn mob_environment(source: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix("MOB")
        .prefix_separator("_")
        .source(source)
}

/// Parse a `.mob` file without touching the process environment.
fn read_mob_file(path: &Path) -> Result<Map<String, String>, MobError> {
    let entries = dotenvy::from_path_iter(path).map_err(|e| MobError::Environment {
        message: format!("cannot read configuration file {}: {e}", path.display()),
    })?;

    let mut values = Map::new();
    for entry in entries {
        let (key, value) = entry.map_err(|e| MobError::Environment {
            message: format!("malformed configuration file {}: {e}", path.display()),
        })?;
        if key.starts_with("MOB_") {
            values.insert(key, value);
        } else {
            tracing::warn!(key = %key, path = %path.display(), "Ignoring unknown configuration key");
        }
    }
    Ok(values)
}

/// `~/.mob`, when a home directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mob"))
}
