//! The decision engine: effective policy + target path → verdict.

use crate::pattern::Pattern;
use crate::policy::{Policy, PolicyMode};

/// The outcome of evaluating a policy against a target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block { reason: String },
    ConfigError { marker_path: String, explanation: String },
}

impl Verdict {
    pub fn is_block(&self) -> bool {
        !matches!(self, Verdict::Allow)
    }
}

const DEFAULT_BLOCK_ALL_MESSAGE: &str = "This directory tree is protected from edits.";
const DEFAULT_NOT_ALLOWED_MESSAGE: &str = "Path is not in the allowed list.";

/// Evaluate `policy` against `target_path` (absolute, slash-normalized).
pub fn decide(policy: &Policy, target_path: &str) -> Verdict {
    if policy.mode == PolicyMode::ConfigError {
        return Verdict::ConfigError {
            marker_path: policy.origin.clone(),
            explanation: policy
                .error_message
                .clone()
                .unwrap_or_else(|| "invalid policy configuration".to_string()),
        };
    }

    if policy.mode == PolicyMode::BlockAll {
        let reason = policy
            .guide
            .clone()
            .unwrap_or_else(|| DEFAULT_BLOCK_ALL_MESSAGE.to_string());
        return Verdict::Block { reason };
    }

    if policy.mode == PolicyMode::AllowList {
        for entry in &policy.selectors {
            if let Some(pattern) = Pattern::compile(entry.pattern()) {
                if pattern.matches_relative_to(target_path, &policy.base_dir) {
                    return Verdict::Allow;
                }
            }
        }
        let reason = policy
            .guide
            .clone()
            .unwrap_or_else(|| DEFAULT_NOT_ALLOWED_MESSAGE.to_string());
        return Verdict::Block { reason };
    }

    // PolicyMode::BlockList
    for entry in &policy.selectors {
        if let Some(pattern) = Pattern::compile(entry.pattern()) {
            if pattern.matches_relative_to(target_path, &policy.base_dir) {
                let reason = entry
                    .guide()
                    .map(String::from)
                    .or_else(|| policy.guide.clone())
                    .unwrap_or_else(|| DEFAULT_BLOCK_ALL_MESSAGE.to_string());
                return Verdict::Block { reason };
            }
        }
    }
    Verdict::Allow
}
