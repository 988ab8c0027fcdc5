//! Sub-agent lifecycle tracker: maintains the `.agent_types.json` registry
//! under an exclusive file lock. Never writes to stdout; always exits 0.

use std::io::Read;
use std::path::PathBuf;

use blockguard::registry::{remove_agent, upsert_agent, DEFAULT_AGENT_TYPE};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TrackerEvent {
    hook_type: String,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    transcript_path: Option<String>,
    #[serde(default)]
    agent_type: Option<String>,
}

fn main() {
    blockguard::logging::init();
    run();
}

fn run() {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return;
    }
    if input.trim().is_empty() {
        return;
    }

    let Ok(event) = serde_json::from_str::<TrackerEvent>(&input) else {
        return;
    };

    let (Some(agent_id), Some(transcript_path)) = (event.agent_id, event.transcript_path) else {
        return;
    };
    let transcript_path = PathBuf::from(transcript_path);

    match event.hook_type.as_str() {
        "SubagentStart" => {
            let agent_type = event
                .agent_type
                .unwrap_or_else(|| DEFAULT_AGENT_TYPE.to_string());
            if let Err(e) = upsert_agent(&transcript_path, &agent_id, &agent_type) {
                tracing::warn!(error = %e, agent_id, "failed to record sub-agent start");
            }
        }
        "SubagentStop" => {
            if let Err(e) = remove_agent(&transcript_path, &agent_id) {
                tracing::warn!(error = %e, agent_id, "failed to record sub-agent stop");
            }
        }
        other => {
            tracing::warn!(hook_type = other, "unrecognized hook_type, ignoring");
        }
    }
}
