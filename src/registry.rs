//! Sub-agent registry I/O: the tracking file written by the tracker binary
//! and read (without locking) by the agent-type resolver.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::{Map, Value};

pub const SUBAGENTS_DIR_NAME: &str = "subagents";
pub const AGENT_TYPES_FILE_NAME: &str = ".agent_types.json";
pub const LOCK_FILE_NAME: &str = ".agent_types.json.lock";
pub const DEFAULT_AGENT_TYPE: &str = "unknown";

/// Directory holding the tracking file and per-agent transcripts, derived
/// from the assistant-supplied transcript path.
pub fn subagents_dir(transcript_path: &Path) -> Option<PathBuf> {
    transcript_path.parent().map(|d| d.join(SUBAGENTS_DIR_NAME))
}

fn tracking_file_path(transcript_path: &Path) -> Option<PathBuf> {
    subagents_dir(transcript_path).map(|d| d.join(AGENT_TYPES_FILE_NAME))
}

fn lock_file_path(transcript_path: &Path) -> Option<PathBuf> {
    subagents_dir(transcript_path).map(|d| d.join(LOCK_FILE_NAME))
}

/// Read the tracking file as an ordered sequence of `(agent_id, agent_type)`
/// pairs. Missing, unreadable, or malformed content is reported as an empty
/// registry rather than an error — every caller here treats it the same as
/// "no sub-agents known yet".
pub fn read_agent_types(transcript_path: &Path) -> Vec<(String, String)> {
    let Some(path) = tracking_file_path(transcript_path) else {
        return Vec::new();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&content) else {
        return Vec::new();
    };
    map.into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect()
}

fn write_agent_types(transcript_path: &Path, entries: &[(String, String)]) -> Result<()> {
    let path = tracking_file_path(transcript_path).context("transcript path has no parent")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    let body = serde_json::to_string_pretty(&Value::Object(map))?;
    std::fs::write(&path, body)?;
    Ok(())
}

fn acquire_lock(transcript_path: &Path) -> Result<(PathBuf, File)> {
    let lock_path = lock_file_path(transcript_path).context("transcript path has no parent")?;
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)?;
    file.lock_exclusive()?;
    Ok((lock_path, file))
}

/// Upsert `agent_id -> agent_type` under an exclusive lock: existing entries
/// keep their position, new entries are appended.
pub fn upsert_agent(transcript_path: &Path, agent_id: &str, agent_type: &str) -> Result<()> {
    let (_lock_path, lock) = acquire_lock(transcript_path)?;
    let mut entries = read_agent_types(transcript_path);
    match entries.iter_mut().find(|(id, _)| id == agent_id) {
        Some((_, ty)) => *ty = agent_type.to_string(),
        None => entries.push((agent_id.to_string(), agent_type.to_string())),
    }
    write_agent_types(transcript_path, &entries)?;
    FileExt::unlock(&lock)?;
    Ok(())
}

/// Remove `agent_id` under an exclusive lock, if present.
pub fn remove_agent(transcript_path: &Path, agent_id: &str) -> Result<()> {
    let (_lock_path, lock) = acquire_lock(transcript_path)?;
    let mut entries = read_agent_types(transcript_path);
    entries.retain(|(id, _)| id != agent_id);
    write_agent_types(transcript_path, &entries)?;
    FileExt::unlock(&lock)?;
    Ok(())
}
