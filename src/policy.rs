//! The policy data model and the per-file marker parser.

use std::path::Path;

use serde_json::{Map, Value};

pub const MARKER_FILE_NAME: &str = ".block";
pub const LOCAL_MARKER_FILE_NAME: &str = ".block.local";

/// Which of the four mutually-exclusive modes a policy is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    BlockAll,
    AllowList,
    BlockList,
    ConfigError,
}

/// One selector pattern, with an optional per-entry guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEntry {
    Bare(String),
    Object {
        pattern: String,
        guide: Option<String>,
    },
}

impl SelectorEntry {
    pub fn pattern(&self) -> &str {
        match self {
            SelectorEntry::Bare(p) => p,
            SelectorEntry::Object { pattern, .. } => pattern,
        }
    }

    pub fn guide(&self) -> Option<&str> {
        match self {
            SelectorEntry::Bare(_) => None,
            SelectorEntry::Object { guide, .. } => guide.as_deref(),
        }
    }

    /// Canonical serialization used for order-preserving deduplication:
    /// bare strings compare by string, object entries by sorted-key JSON.
    fn canonical_key(&self) -> String {
        match self {
            SelectorEntry::Bare(p) => p.clone(),
            SelectorEntry::Object { pattern, guide } => {
                let mut map = Map::new();
                if let Some(g) = guide {
                    map.insert("guide".to_string(), Value::String(g.clone()));
                }
                map.insert("pattern".to_string(), Value::String(pattern.clone()));
                Value::Object(map).to_string()
            }
        }
    }
}

/// Dedup a sequence of selector entries, preserving first-seen order.
pub fn dedup_selectors(entries: impl IntoIterator<Item = SelectorEntry>) -> Vec<SelectorEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        let key = entry.canonical_key();
        if seen.insert(key) {
            out.push(entry);
        }
    }
    out
}

/// The independently-optional agent-scope fields of a policy. Each field's
/// presence (not just its value) must survive merges, so both are `Option`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentScope {
    pub agents_list: Option<Vec<String>>,
    pub disable_main: Option<bool>,
}

impl AgentScope {
    pub fn is_empty(&self) -> bool {
        self.agents_list.is_none() && self.disable_main.is_none()
    }
}

/// A resolved (or per-file) policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub mode: PolicyMode,
    pub selectors: Vec<SelectorEntry>,
    pub guide: Option<String>,
    pub agent_scope: AgentScope,
    pub error_message: Option<String>,
    pub origin: String,
    /// Directory against which selector patterns are matched — the
    /// directory of the closest (deepest) contributing marker file.
    pub base_dir: String,
}

impl Policy {
    pub fn block_all(origin: impl Into<String>, guide: Option<String>) -> Self {
        Self {
            mode: PolicyMode::BlockAll,
            selectors: Vec::new(),
            guide,
            agent_scope: AgentScope::default(),
            error_message: None,
            origin: origin.into(),
            base_dir: String::new(),
        }
    }

    pub fn config_error(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            mode: PolicyMode::ConfigError,
            selectors: Vec::new(),
            guide: None,
            agent_scope: AgentScope::default(),
            error_message: Some(message.into()),
            origin: origin.into(),
            base_dir: String::new(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }
}

/// Read and interpret one marker file. Returns `None` if the file is
/// missing or unreadable (treated as "no policy at this level"); otherwise
/// always returns `Some`, even for empty/malformed content (`BlockAll`).
pub fn parse_marker_file(path: &Path) -> Option<Policy> {
    let content = std::fs::read_to_string(path).ok()?;
    let origin = path.display().to_string();
    let base_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Some(Policy::block_all(origin, None).with_base_dir(base_dir));
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return Some(Policy::block_all(origin, None).with_base_dir(base_dir)),
    };

    let Value::Object(obj) = value else {
        // Valid JSON but not an object (e.g. a bare array or string) is not
        // a meaningful policy body; treat it the same as non-JSON content.
        return Some(Policy::block_all(origin, None).with_base_dir(base_dir));
    };

    Some(interpret_marker_object(&obj, origin).with_base_dir(base_dir))
}

fn interpret_marker_object(obj: &Map<String, Value>, origin: String) -> Policy {
    let guide = obj.get("guide").and_then(Value::as_str).map(String::from);
    let agent_scope = parse_agent_scope(obj);

    let has_allowed = obj.contains_key("allowed");
    let has_blocked = obj.contains_key("blocked");

    if has_allowed && has_blocked {
        let mut err = Policy::config_error(
            origin,
            "cannot specify both allowed and blocked lists",
        );
        err.agent_scope = agent_scope;
        return err;
    }

    if has_allowed {
        let selectors = obj
            .get("allowed")
            .map(parse_selector_entries)
            .unwrap_or_default();
        return Policy {
            mode: PolicyMode::AllowList,
            selectors,
            guide,
            agent_scope,
            error_message: None,
            origin,
            base_dir: String::new(),
        };
    }

    if has_blocked {
        let selectors = obj
            .get("blocked")
            .map(parse_selector_entries)
            .unwrap_or_default();
        return Policy {
            mode: PolicyMode::BlockList,
            selectors,
            guide,
            agent_scope,
            error_message: None,
            origin,
            base_dir: String::new(),
        };
    }

    Policy {
        mode: PolicyMode::BlockAll,
        selectors: Vec::new(),
        guide,
        agent_scope,
        error_message: None,
        origin,
        base_dir: String::new(),
    }
}

fn parse_agent_scope(obj: &Map<String, Value>) -> AgentScope {
    let agents_list = obj.get("agents").and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    });
    let disable_main = obj.get("disable_main_agent").and_then(Value::as_bool);
    AgentScope {
        agents_list,
        disable_main,
    }
}

fn parse_selector_entries(value: &Value) -> Vec<SelectorEntry> {
    let Some(arr) = value.as_array() else {
        return Vec::new();
    };
    arr.iter().filter_map(parse_selector_entry).collect()
}

fn parse_selector_entry(value: &Value) -> Option<SelectorEntry> {
    match value {
        Value::String(s) => Some(SelectorEntry::Bare(s.clone())),
        Value::Object(obj) => {
            let pattern = obj.get("pattern").and_then(Value::as_str)?.to_string();
            let guide = obj.get("guide").and_then(Value::as_str).map(String::from);
            Some(SelectorEntry::Object { pattern, guide })
        }
        _ => None,
    }
}

/// `true` if `basename` is one of the two marker file names.
pub fn is_marker_file_name(basename: &str) -> bool {
    basename == MARKER_FILE_NAME || basename == LOCAL_MARKER_FILE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_marker_file(&dir.path().join(".block")).is_none());
    }

    #[test]
    fn empty_file_is_block_all() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), ".block", "");
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.mode, PolicyMode::BlockAll);
    }

    #[test]
    fn whitespace_only_is_block_all() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), ".block", "   \n\t ");
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.mode, PolicyMode::BlockAll);
    }

    #[test]
    fn non_json_is_block_all_not_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), ".block", "not json at all {{{");
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.mode, PolicyMode::BlockAll);
    }

    #[test]
    fn both_allowed_and_blocked_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), ".block", r#"{"allowed":["a"],"blocked":["b"]}"#);
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.mode, PolicyMode::ConfigError);
        assert!(policy
            .error_message
            .unwrap()
            .contains("cannot specify both allowed and blocked lists"));
    }

    #[test]
    fn allowed_list_parses_bare_and_object_entries() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            ".block",
            r#"{"allowed":["*.txt", {"pattern":"src/**","guide":"generated"}]}"#,
        );
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.mode, PolicyMode::AllowList);
        assert_eq!(policy.selectors.len(), 2);
        assert_eq!(policy.selectors[0].pattern(), "*.txt");
        assert_eq!(policy.selectors[1].pattern(), "src/**");
        assert_eq!(policy.selectors[1].guide(), Some("generated"));
    }

    #[test]
    fn agents_and_disable_main_are_independently_optional() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), ".block", r#"{"disable_main_agent":true}"#);
        let policy = parse_marker_file(&p).unwrap();
        assert_eq!(policy.agent_scope.agents_list, None);
        assert_eq!(policy.agent_scope.disable_main, Some(true));
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let entries = vec![
            SelectorEntry::Bare("*.txt".to_string()),
            SelectorEntry::Bare("*.js".to_string()),
            SelectorEntry::Bare("*.txt".to_string()),
        ];
        let deduped = dedup_selectors(entries);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].pattern(), "*.txt");
        assert_eq!(deduped[1].pattern(), "*.js");
    }

    #[test]
    fn dedup_distinguishes_bare_from_object_with_same_pattern() {
        let entries = vec![
            SelectorEntry::Bare("*.txt".to_string()),
            SelectorEntry::Object {
                pattern: "*.txt".to_string(),
                guide: None,
            },
        ];
        let deduped = dedup_selectors(entries);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn is_marker_file_name_matches_both_variants() {
        assert!(is_marker_file_name(".block"));
        assert!(is_marker_file_name(".block.local"));
        assert!(!is_marker_file_name(".blockrc"));
    }
}
