//! Same-directory and hierarchical policy merging.

use crate::policy::{dedup_selectors, AgentScope, Policy, PolicyMode};

fn merge_guide(winner: Option<&str>, fallback: Option<&str>) -> Option<String> {
    match winner {
        Some(g) if !g.is_empty() => Some(g.to_string()),
        _ => fallback.map(String::from),
    }
}

fn merge_agent_scope(winner: &AgentScope, fallback: &AgentScope) -> AgentScope {
    AgentScope {
        agents_list: winner
            .agents_list
            .clone()
            .or_else(|| fallback.agents_list.clone()),
        disable_main: winner.disable_main.or(fallback.disable_main),
    }
}

/// Merge a directory's main (`.block`) and local (`.block.local`) policies.
/// `local` is `None` if no `.block.local` exists in that directory.
pub fn merge_same_directory(main: Policy, local: Option<Policy>) -> Policy {
    let Some(local) = local else {
        return main;
    };

    if main.mode == PolicyMode::ConfigError {
        return main;
    }
    if local.mode == PolicyMode::ConfigError {
        return local;
    }

    let origin = format!("{} + {}", main.origin, local.origin);

    if (main.mode == PolicyMode::AllowList && local.mode == PolicyMode::BlockList)
        || (main.mode == PolicyMode::BlockList && local.mode == PolicyMode::AllowList)
    {
        return Policy::config_error(origin, "cannot mix allowed and blocked modes");
    }

    if main.mode == PolicyMode::BlockAll || local.mode == PolicyMode::BlockAll {
        let guide = merge_guide(local.guide.as_deref(), main.guide.as_deref());
        return Policy {
            mode: PolicyMode::BlockAll,
            selectors: Vec::new(),
            guide,
            agent_scope: merge_agent_scope(&local.agent_scope, &main.agent_scope),
            error_message: None,
            origin,
            base_dir: main.base_dir,
        };
    }

    let (mode, selectors) = match (main.mode, local.mode) {
        (PolicyMode::BlockList, PolicyMode::BlockList) => {
            let combined = main
                .selectors
                .into_iter()
                .chain(local.selectors.into_iter());
            (PolicyMode::BlockList, dedup_selectors(combined))
        }
        (PolicyMode::AllowList, PolicyMode::AllowList) => (PolicyMode::AllowList, local.selectors),
        // Mixed AllowList/BlockAll or BlockList/BlockAll are handled above;
        // any remaining combination is same-mode AllowList or BlockList.
        (_, PolicyMode::AllowList) => (PolicyMode::AllowList, local.selectors),
        (PolicyMode::AllowList, _) => (PolicyMode::AllowList, main.selectors),
        (_, PolicyMode::BlockList) => (PolicyMode::BlockList, local.selectors),
        (mode, _) => (mode, main.selectors),
    };

    Policy {
        mode,
        selectors,
        guide: merge_guide(local.guide.as_deref(), main.guide.as_deref()),
        agent_scope: merge_agent_scope(&local.agent_scope, &main.agent_scope),
        error_message: None,
        origin,
        base_dir: main.base_dir,
    }
}

/// Merge a `child` policy (closer to the target) with its `parent`.
pub fn merge_hierarchical(child: Policy, parent: Policy) -> Policy {
    if child.mode == PolicyMode::ConfigError {
        return child;
    }
    if parent.mode == PolicyMode::ConfigError {
        return parent;
    }

    let origin = format!("{} + {}", child.origin, parent.origin);
    let guide = merge_guide(child.guide.as_deref(), parent.guide.as_deref());
    let agent_scope = merge_agent_scope(&child.agent_scope, &parent.agent_scope);

    if child.mode == PolicyMode::BlockAll {
        return Policy {
            mode: PolicyMode::BlockAll,
            selectors: Vec::new(),
            guide,
            agent_scope,
            error_message: None,
            origin,
            base_dir: child.base_dir,
        };
    }

    if child.mode == PolicyMode::AllowList {
        return Policy {
            mode: PolicyMode::AllowList,
            selectors: child.selectors,
            guide,
            agent_scope,
            error_message: None,
            origin,
            base_dir: child.base_dir,
        };
    }

    // child.mode == PolicyMode::BlockList
    match parent.mode {
        PolicyMode::AllowList => Policy::config_error(
            origin,
            "parent and child .block files cannot mix allowed and blocked modes",
        ),
        PolicyMode::BlockAll => Policy {
            mode: PolicyMode::BlockList,
            selectors: child.selectors,
            guide,
            agent_scope,
            error_message: None,
            origin,
            base_dir: child.base_dir,
        },
        PolicyMode::BlockList => {
            let base_dir = child.base_dir.clone();
            let combined = child
                .selectors
                .into_iter()
                .chain(parent.selectors.into_iter());
            Policy {
                mode: PolicyMode::BlockList,
                selectors: dedup_selectors(combined),
                guide,
                agent_scope,
                error_message: None,
                origin,
                base_dir,
            }
        }
        PolicyMode::ConfigError => unreachable!("handled above"),
    }
}
