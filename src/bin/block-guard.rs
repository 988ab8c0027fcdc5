//! Pre-tool guard: reads one tool invocation on stdin, vetoes it if it
//! would write somewhere a `.block`/`.block.local` hierarchy forbids.

use std::io::Read;
use std::path::PathBuf;

use blockguard::agent::{policy_applies, AgentResolutionCache};
use blockguard::decide::{decide, Verdict};
use blockguard::policy::is_marker_file_name;
use blockguard::resolve::{
    any_marker_on_ancestor_chain, directory_target_extra_policies, resolve_policy_for_path,
};
use blockguard::tool::{resolve_against_cwd, ToolInvocation};

fn main() {
    blockguard::logging::init();
    emit(run());
}

fn run() -> Verdict {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return Verdict::Allow;
    }
    if input.trim().is_empty() {
        return Verdict::Allow;
    }

    let Ok(cwd) = std::env::current_dir() else {
        return Verdict::Allow;
    };

    // Fast reject: a likely target path by naive substring search, walked
    // upward for marker existence only. Optimization, never authoritative.
    if let Some(likely_path) = fast_extract_path(&input) {
        let resolved = resolve_against_cwd(&likely_path, &cwd);
        if let Some(dir) = resolved.parent() {
            if !any_marker_on_ancestor_chain(dir) {
                return Verdict::Allow;
            }
        }
    }

    let Ok(invocation) = serde_json::from_str::<ToolInvocation>(&input) else {
        return Verdict::Allow;
    };

    let mut agent_cache = AgentResolutionCache::new(
        invocation.tool_use_id.clone(),
        invocation.transcript_path.as_ref().map(PathBuf::from),
    );

    for candidate in invocation.candidate_paths(&cwd) {
        let basename = candidate
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        if is_marker_file_name(basename) && candidate.exists() {
            return marker_removal_verdict(basename, &candidate);
        }

        if let Some(policy) = resolve_policy_for_path(&candidate) {
            let agent_type = agent_cache.resolve();
            if policy_applies(&policy, agent_type.as_deref()) {
                let verdict = decide(&policy, &candidate.to_string_lossy());
                if verdict.is_block() {
                    return verdict;
                }
            }
        }

        if candidate.is_dir() {
            for extra in directory_target_extra_policies(&candidate) {
                let agent_type = agent_cache.resolve();
                if policy_applies(&extra, agent_type.as_deref()) {
                    let verdict = decide(&extra, &candidate.to_string_lossy());
                    if verdict.is_block() {
                        return verdict;
                    }
                }
            }
        }
    }

    Verdict::Allow
}

fn marker_removal_verdict(basename: &str, path: &std::path::Path) -> Verdict {
    let reason = format!(
        "BLOCKED: Cannot modify {basename}\n\n\
         Target file: {}\n\n\
         The {basename} file is protected and cannot be modified or removed.\n\
         This is a safety mechanism to ensure directory protection remains in effect.\n\n\
         To remove protection, manually delete the file using your file manager or terminal.",
        path.display()
    );
    Verdict::Block { reason }
}

/// A deliberately naive scan for `"file_path"`/`"notebook_path"` string
/// values, used only to decide whether full JSON parsing is worth doing.
fn fast_extract_path(raw: &str) -> Option<String> {
    for key in ["file_path", "notebook_path"] {
        if let Some(path) = extract_json_string_value(raw, key) {
            return Some(path);
        }
    }
    None
}

fn extract_json_string_value(raw: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\"");
    let key_pos = raw.find(&needle)?;
    let after_key = &raw[key_pos + needle.len()..];
    let colon_pos = after_key.find(':')?;
    let after_colon = after_key[colon_pos + 1..].trim_start();
    let rest = after_colon.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn emit(verdict: Verdict) {
    let reason = match verdict {
        Verdict::Allow => return,
        Verdict::Block { reason } => reason,
        Verdict::ConfigError {
            marker_path,
            explanation,
        } => format!(
            "BLOCKED: Invalid .block configuration\n\n\
             Marker file: {marker_path}\n\
             Error: {explanation}\n\n\
             Please fix the configuration file. Valid formats:\n\
             \u{20}\u{20}- Empty file or {{}} = block everything\n\
             \u{20}\u{20}- {{ \"allowed\": [\"pattern\"] }} = only allow matching paths\n\
             \u{20}\u{20}- {{ \"blocked\": [\"pattern\"] }} = only block matching paths"
        ),
    };
    println!("{}", serde_json::json!({"decision": "block", "reason": reason}));
}
