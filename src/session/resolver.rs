//! Derivation of the (base, wip) pair from the current branch name

use crate::branch::{Branch, LEGACY_BASE_BRANCH, LEGACY_WIP_BRANCH};
use crate::config::MobConfig;
use crate::errors::MobError;

/// Resolved base and wip branch for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPair {
    pub base: Branch,
    pub wip: Branch,
}

/// Resolve the base and wip branch for `current`.
///
/// Fails with [`MobError::InvariantViolation`] when both names coincide, or
/// when no fixed base branch is configured and `current` is neither of them.
pub fn determine_branches(
    current: &Branch,
    local_branches: &[String],
    config: &MobConfig,
) -> Result<SessionPair, MobError> {
    let pair = if current.is(LEGACY_WIP_BRANCH)
        || (current.is(LEGACY_BASE_BRANCH) && !config.custom_wip_branch_qualifier_configured())
    {
        SessionPair {
            base: Branch::new(LEGACY_BASE_BRANCH),
            wip: Branch::new(LEGACY_WIP_BRANCH),
        }
    } else {
        SessionPair {
            base: base_branch(current, local_branches, config),
            wip: wip_branch(current, config),
        }
    };

    tracing::debug!(
        current = %current,
        base = %pair.base,
        wip = %pair.wip,
        local_branches = %local_branches.join(","),
        "Determined branches"
    );

    let detached_from_pair = !config.custom_fixed_base_branch_configured()
        && current != &pair.base
        && current != &pair.wip;
    if detached_from_pair || pair.base == pair.wip {
        return Err(MobError::InvariantViolation {
            current: current.to_string(),
            base: pair.base.to_string(),
            wip: pair.wip.to_string(),
        });
    }
    Ok(pair)
}

pub fn wip_branch(current: &Branch, config: &MobConfig) -> Branch {
    if current.is_wip_branch(config) {
        return current.clone();
    }

    // with a fixed base the qualifier alone names the wip branch
    let root = if config.custom_fixed_base_branch_configured()
        && config.custom_wip_branch_qualifier_configured()
    {
        Branch::new("")
    } else {
        current.clone()
    };
    root.add_wip_prefix(config).add_wip_qualifier(config)
}

pub fn base_branch(current: &Branch, local_branches: &[String], config: &MobConfig) -> Branch {
    if config.custom_fixed_base_branch_configured() {
        Branch::new(&config.fixed_base_branch)
    } else if current.is_wip_branch(config) {
        current
            .remove_wip_prefix(config)
            .remove_wip_qualifier(local_branches, config)
    } else {
        current.clone()
    }
}

/// Remote wip branches that belong to `base`, with and without qualifier.
pub fn wip_branches_for_base(
    base: &Branch,
    remote_branches: &[String],
    config: &MobConfig,
) -> Vec<String> {
    let with_qualifier = base
        .add_wip_prefix(config)
        .add_wip_qualifier(config)
        .remote(config);
    let without_qualifier = if base.is(LEGACY_BASE_BRANCH) {
        Branch::new(LEGACY_WIP_BRANCH)
    } else {
        base.add_wip_prefix(config).remote(config)
    };

    remote_branches
        .iter()
        .filter(|remote| {
            remote.contains(with_qualifier.name()) || remote.contains(without_qualifier.name())
        })
        .cloned()
        .collect()
}
