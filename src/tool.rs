//! The tool-invocation record read from standard input, and candidate-path
//! extraction per tool name.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::shell::extract_write_targets;

#[derive(Debug, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
}

impl ToolInvocation {
    /// Candidate absolute paths this invocation could write to, resolved
    /// against `cwd` when a path is relative. Unknown tool names yield no
    /// candidates (treated as an allow by the caller).
    pub fn candidate_paths(&self, cwd: &Path) -> Vec<PathBuf> {
        let raw_paths: Vec<String> = match self.tool_name.as_str() {
            "Edit" | "Write" => self
                .tool_input
                .get("file_path")
                .and_then(Value::as_str)
                .into_iter()
                .map(String::from)
                .collect(),
            "NotebookEdit" => self
                .tool_input
                .get("notebook_path")
                .and_then(Value::as_str)
                .into_iter()
                .map(String::from)
                .collect(),
            "Bash" => {
                let command = self
                    .tool_input
                    .get("command")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                extract_write_targets(command).into_iter().collect()
            }
            _ => Vec::new(),
        };

        raw_paths
            .into_iter()
            .map(|p| resolve_against_cwd(&p, cwd))
            .collect()
    }
}

/// Resolve `path` against `cwd` if it is not already absolute, normalizing
/// backslashes to `/` first.
pub fn resolve_against_cwd(path: &str, cwd: &Path) -> PathBuf {
    let normalized = path.replace('\\', "/");
    let candidate = PathBuf::from(&normalized);
    if candidate.is_absolute() {
        candidate
    } else {
        cwd.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation(tool_name: &str, tool_input: Value) -> ToolInvocation {
        ToolInvocation {
            tool_name: tool_name.to_string(),
            tool_input,
            tool_use_id: None,
            transcript_path: None,
        }
    }

    #[test]
    fn edit_extracts_file_path() {
        let inv = invocation("Edit", json!({"file_path": "/proj/a.txt"}));
        let paths = inv.candidate_paths(Path::new("/cwd"));
        assert_eq!(paths, vec![PathBuf::from("/proj/a.txt")]);
    }

    #[test]
    fn write_relative_path_resolves_against_cwd() {
        let inv = invocation("Write", json!({"file_path": "sub/a.txt"}));
        let paths = inv.candidate_paths(Path::new("/cwd"));
        assert_eq!(paths, vec![PathBuf::from("/cwd/sub/a.txt")]);
    }

    #[test]
    fn notebook_edit_extracts_notebook_path() {
        let inv = invocation("NotebookEdit", json!({"notebook_path": "/proj/nb.ipynb"}));
        let paths = inv.candidate_paths(Path::new("/cwd"));
        assert_eq!(paths, vec![PathBuf::from("/proj/nb.ipynb")]);
    }

    #[test]
    fn bash_extracts_targets_via_shell_dissector() {
        let inv = invocation("Bash", json!({"command": "touch /proj/new.txt"}));
        let paths = inv.candidate_paths(Path::new("/cwd"));
        assert_eq!(paths, vec![PathBuf::from("/proj/new.txt")]);
    }

    #[test]
    fn unknown_tool_yields_no_candidates() {
        let inv = invocation("Read", json!({"file_path": "/proj/a.txt"}));
        assert!(inv.candidate_paths(Path::new("/cwd")).is_empty());
    }
}
