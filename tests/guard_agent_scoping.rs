//! Integration tests covering agent-scoped policies end to end: a marker
//! file's `agents`/`disable_main_agent` fields gated behind an actual
//! sub-agent registry and transcript correlation.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

fn guard() -> Command {
    Command::cargo_bin("block-guard").unwrap()
}

fn edit_input_for_agent(file_path: &str, tool_use_id: &str, transcript_path: &str) -> String {
    json!({
        "tool_name": "Edit",
        "tool_input": {"file_path": file_path, "old_string": "a", "new_string": "b"},
        "tool_use_id": tool_use_id,
        "transcript_path": transcript_path
    })
    .to_string()
}

fn write_marker(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(".block"), content).unwrap();
}

fn setup_subagent(transcript_path: &Path, agent_id: &str, agent_type: &str, tool_use_id: &str) {
    let subdir = transcript_path.parent().unwrap().join("subagents");
    fs::create_dir_all(&subdir).unwrap();
    let existing = subdir.join(".agent_types.json");
    let mut map = if existing.exists() {
        serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(
            &fs::read_to_string(&existing).unwrap(),
        )
        .unwrap()
    } else {
        serde_json::Map::new()
    };
    map.insert(agent_id.to_string(), serde_json::Value::String(agent_type.to_string()));
    fs::write(&existing, serde_json::to_string(&map).unwrap()).unwrap();
    fs::write(
        subdir.join(format!("{agent_id}.jsonl")),
        format!("line mentioning {tool_use_id}\n"),
    )
    .unwrap();
}

#[test]
fn agents_list_exempts_main_agent_but_governs_listed_subagent() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("proj");
    write_marker(&project, r#"{"blocked":["*.secret"],"agents":["Explore"]}"#);

    // Main agent: no tool_use_id/transcript_path at all -> exempt.
    guard()
        .write_stdin(json!({
            "tool_name": "Edit",
            "tool_input": {"file_path": project.join("a.secret").to_str().unwrap(), "old_string": "a", "new_string": "b"}
        }).to_string())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // Sub-agent of type "Explore": governed, blocked.
    let transcript_path = dir.path().join("session").join("t.jsonl");
    fs::create_dir_all(transcript_path.parent().unwrap()).unwrap();
    setup_subagent(&transcript_path, "agent-1", "Explore", "tu-1");

    guard()
        .write_stdin(edit_input_for_agent(
            project.join("a.secret").to_str().unwrap(),
            "tu-1",
            transcript_path.to_str().unwrap(),
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\":\"block\""));
}

#[test]
fn agents_list_does_not_govern_subagent_of_different_type() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("proj");
    write_marker(&project, r#"{"blocked":["*.secret"],"agents":["Explore"]}"#);

    let transcript_path = dir.path().join("session").join("t.jsonl");
    fs::create_dir_all(transcript_path.parent().unwrap()).unwrap();
    setup_subagent(&transcript_path, "agent-2", "Review", "tu-2");

    guard()
        .write_stdin(edit_input_for_agent(
            project.join("a.secret").to_str().unwrap(),
            "tu-2",
            transcript_path.to_str().unwrap(),
        ))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn disable_main_agent_exempts_main_but_not_subagents() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("proj");
    write_marker(&project, r#"{"disable_main_agent":true}"#);

    guard()
        .write_stdin(json!({
            "tool_name": "Edit",
            "tool_input": {"file_path": project.join("a.txt").to_str().unwrap(), "old_string": "a", "new_string": "b"}
        }).to_string())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let transcript_path = dir.path().join("session").join("t.jsonl");
    fs::create_dir_all(transcript_path.parent().unwrap()).unwrap();
    setup_subagent(&transcript_path, "agent-3", "Plan", "tu-3");

    guard()
        .write_stdin(edit_input_for_agent(
            project.join("a.txt").to_str().unwrap(),
            "tu-3",
            transcript_path.to_str().unwrap(),
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decision\":\"block\""));
}
