//! Agent-type resolution and the agent-scoping filter.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::policy::Policy;
use crate::registry::{self, subagents_dir};

/// Resolve the sub-agent type that issued `tool_use_id`, by correlating it
/// against the live sub-agent transcripts recorded under
/// `{dirname(transcript_path)}/subagents/`. Returns `None` for the main
/// agent, or when resolution is impossible.
pub fn resolve_agent_type(tool_use_id: Option<&str>, transcript_path: Option<&Path>) -> Option<String> {
    let tool_use_id = tool_use_id.filter(|s| !s.is_empty())?;
    let transcript_path = transcript_path.filter(|p| !p.as_os_str().is_empty())?;

    let subdir = subagents_dir(transcript_path)?;
    for (agent_id, agent_type) in registry::read_agent_types(transcript_path) {
        let transcript = subdir.join(format!("{agent_id}.jsonl"));
        if transcript_contains(&transcript, tool_use_id) {
            return Some(agent_type);
        }
    }
    None
}

fn transcript_contains(path: &Path, needle: &str) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .any(|line| line.contains(needle))
}

/// Lazily resolves and caches the agent type for one guard invocation, so
/// multiple candidate-path evaluations that each consult the same policy
/// scope pay the transcript-scanning cost at most once.
pub struct AgentResolutionCache {
    tool_use_id: Option<String>,
    transcript_path: Option<PathBuf>,
    resolved: Option<Option<String>>,
}

impl AgentResolutionCache {
    pub fn new(tool_use_id: Option<String>, transcript_path: Option<PathBuf>) -> Self {
        Self {
            tool_use_id,
            transcript_path,
            resolved: None,
        }
    }

    pub fn resolve(&mut self) -> Option<String> {
        if let Some(cached) = &self.resolved {
            return cached.clone();
        }
        let result = resolve_agent_type(
            self.tool_use_id.as_deref(),
            self.transcript_path.as_deref(),
        );
        self.resolved = Some(result.clone());
        result
    }
}

/// Does `policy` apply to the invocation whose resolved agent type is
/// `agent_type` (`None` meaning the main agent)?
pub fn policy_applies(policy: &Policy, agent_type: Option<&str>) -> bool {
    if policy.agent_scope.is_empty() {
        return true;
    }

    match agent_type {
        None => {
            if policy.agent_scope.agents_list.is_some() {
                false
            } else {
                policy.agent_scope.disable_main != Some(true)
            }
        }
        Some(t) => match &policy.agent_scope.agents_list {
            Some(list) => list.iter().any(|a| a == t),
            None => true,
        },
    }
}
