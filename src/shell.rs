//! Extraction of filesystem write targets from a shell command string.
//!
//! A POSIX-style tokenizer pass runs first; a regex sweep then runs
//! unconditionally as an additive fallback, recovering paths the tokenizer
//! could have missed (e.g. because quoting made it bail out entirely). The
//! regex pass never removes anything the tokenizer found.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

const SEQUENCE_SEPARATORS: &[&str] = &["|", ";", "&", "&&", "||"];
const SINGLE_PATH_CMDS: &[&str] = &["touch", "mkdir", "rmdir", "tee"];
const MULTI_PATH_CMDS: &[&str] = &["rm", "mv", "cp"];
const INPLACE_EDITORS: &[&str] = &["sed", "awk", "gawk", "nawk", "mawk", "perl"];

/// Extract the set of paths `command` would write to. Order is not
/// meaningful; duplicates are collapsed.
pub fn extract_write_targets(command: &str) -> HashSet<String> {
    let mut targets = HashSet::new();

    if let Ok(tokens) = shell_words::split(command) {
        extract_from_tokens(&tokens, &mut targets);
    }

    extract_via_regex(command, &mut targets);
    targets
}

fn is_separator(token: &str) -> bool {
    SEQUENCE_SEPARATORS.contains(&token)
}

fn extract_from_tokens(tokens: &[String], targets: &mut HashSet<String>) {
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();

        if is_separator(token) {
            i += 1;
            continue;
        }

        if token.starts_with('>') && token != ">" && token != ">>" {
            let path = token.trim_start_matches('>');
            if !path.is_empty() && !path.starts_with('-') {
                targets.insert(path.to_string());
            }
            i += 1;
            continue;
        }

        if token == ">" || token == ">>" {
            if let Some(next) = tokens.get(i + 1) {
                if !next.is_empty() && !next.starts_with('-') {
                    targets.insert(next.clone());
                }
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if let Some(path) = token.strip_prefix("of=") {
            if !path.is_empty() && !path.starts_with('-') {
                targets.insert(path.to_string());
            }
            i += 1;
            continue;
        }

        if SINGLE_PATH_CMDS.contains(&token) || MULTI_PATH_CMDS.contains(&token) {
            i += 1;
            while i < tokens.len() {
                let arg = tokens[i].as_str();
                if is_separator(arg) || arg == ">" || arg == ">>" {
                    break;
                }
                if arg.starts_with('-') {
                    i += 1;
                    continue;
                }
                targets.insert(arg.to_string());
                i += 1;
            }
            continue;
        }

        if token == "patch" {
            i += 1;
            let segment = take_segment(tokens, &mut i);
            targets.extend(handle_patch(&segment));
            continue;
        }

        if INPLACE_EDITORS.contains(&token) {
            i += 1;
            let segment = take_segment(tokens, &mut i);
            targets.extend(handle_inplace_editor(&segment));
            continue;
        }

        i += 1;
    }
}

/// Collect tokens up to (not including) the next pipeline/sequence
/// separator, advancing `i` past them.
fn take_segment(tokens: &[String], i: &mut usize) -> Vec<String> {
    let start = *i;
    while *i < tokens.len() && !is_separator(&tokens[*i]) {
        *i += 1;
    }
    tokens[start..*i].to_vec()
}

fn handle_patch(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "-o" {
            if let Some(v) = args.get(i + 1) {
                out.push(v.clone());
            }
            i += 2;
            continue;
        }
        if arg == "-i" || arg == "-d" {
            i += 2;
            continue;
        }
        if arg.starts_with('-') {
            i += 1;
            continue;
        }
        out.push(arg.to_string());
        i += 1;
    }
    out
}

/// `sed`/`awk`/`perl` family: only treated as file-writers when invoked
/// with an in-place flag (`-i`, `-i.bak`, ...). Once that is seen, the
/// first non-option token is the program/script (skipped) and subsequent
/// non-option tokens are files.
fn handle_inplace_editor(args: &[String]) -> Vec<String> {
    let has_inplace = args.iter().any(|a| a == "-i" || a.starts_with("-i"));
    if !has_inplace {
        return Vec::new();
    }
    args.iter()
        .filter(|a| !a.starts_with('-'))
        .skip(1)
        .cloned()
        .collect()
}

struct FallbackPattern {
    regex: Regex,
    group: usize,
}

static FALLBACK_PATTERNS: LazyLock<Vec<FallbackPattern>> = LazyLock::new(|| {
    let specs: &[(&str, usize)] = &[
        (r#"\brm\s+(?:-[rRfiv]+\s+)*"([^"]+)""#, 1),
        (r"\brm\s+(?:-[rRfiv]+\s+)*'([^']+)'", 1),
        (r"\brm\s+(?:-[rRfiv]+\s+)*([^\s|;&]+)", 1),
        (r#"\btouch\s+"([^"]+)""#, 1),
        (r"\btouch\s+'([^']+)'", 1),
        (r"\btouch\s+([^\s|;&]+)", 1),
        (r#"\bmkdir\s+(?:-p\s+)?"([^"]+)""#, 1),
        (r"\bmkdir\s+(?:-p\s+)?'([^']+)'", 1),
        (r"\bmkdir\s+(?:-p\s+)?([^\s|;&]+)", 1),
        (r#"\brmdir\s+"([^"]+)""#, 1),
        (r"\brmdir\s+'([^']+)'", 1),
        (r"\brmdir\s+([^\s|;&]+)", 1),
        (r#">\s*"([^"]+)""#, 1),
        (r">\s*'([^']+)'", 1),
        (r">\s*([^\s|;&>]+)", 1),
        (r#"\btee\s+(?:-a\s+)?"([^"]+)""#, 1),
        (r"\btee\s+(?:-a\s+)?'([^']+)'", 1),
        (r"\btee\s+(?:-a\s+)?([^\s|;&]+)", 1),
        (r#"\bof="([^"]+)""#, 1),
        (r"\bof='([^']+)'", 1),
        (r"\bof=([^\s|;&]+)", 1),
    ];
    specs
        .iter()
        .map(|(pattern, group)| FallbackPattern {
            regex: Regex::new(pattern).expect("fallback pattern is a fixed, valid regex"),
            group: *group,
        })
        .collect()
});

static MV_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"\bmv\s+(?:-[fiv]+\s+)*"([^"]+)"\s+"([^"]+)""#,
        r"\bmv\s+(?:-[fiv]+\s+)*'([^']+)'\s+'([^']+)'",
        r"\bmv\s+(?:-[fiv]+\s+)*([^\s|;&]+)\s+([^\s|;&]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("fixed pattern"))
    .collect()
});

static CP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"\bcp\s+(?:-[rRfiv]+\s+)*"([^"]+)"\s+"([^"]+)""#,
        r"\bcp\s+(?:-[rRfiv]+\s+)*'([^']+)'\s+'([^']+)'",
        r"\bcp\s+(?:-[rRfiv]+\s+)*([^\s|;&]+)\s+([^\s|;&]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("fixed pattern"))
    .collect()
});

/// Strip a stray leading/trailing quote left over when the broad unquoted
/// fallback pattern happens to swallow one (the quoted variants never
/// capture their own delimiters, so this is a no-op for them).
fn clean_fallback_path(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}

fn insert_fallback_match(targets: &mut HashSet<String>, raw: &str) {
    let path = clean_fallback_path(raw);
    if !path.is_empty() && !path.starts_with('-') {
        targets.insert(path.to_string());
    }
}

fn extract_via_regex(command: &str, targets: &mut HashSet<String>) {
    for spec in FALLBACK_PATTERNS.iter() {
        for cap in spec.regex.captures_iter(command) {
            if let Some(m) = cap.get(spec.group) {
                insert_fallback_match(targets, m.as_str());
            }
        }
    }

    for pattern in MV_PATTERNS.iter() {
        if let Some(cap) = pattern.captures(command) {
            for group in [1, 2] {
                if let Some(m) = cap.get(group) {
                    insert_fallback_match(targets, m.as_str());
                }
            }
            break;
        }
    }

    for pattern in CP_PATTERNS.iter() {
        if let Some(cap) = pattern.captures(command) {
            for group in [1, 2] {
                if let Some(m) = cap.get(group) {
                    insert_fallback_match(targets, m.as_str());
                }
            }
            break;
        }
    }
}
