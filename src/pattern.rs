//! Glob-to-regex compiler for `.block` selector patterns.
//!
//! Patterns are always matched against a path relative to the directory
//! containing the marker file that owns them (see [`Pattern::is_match`]).
//! `*` excludes `/`, `**` at the start of the pattern (followed by `/`)
//! matches an optional prefix of any depth, `**` anywhere else matches
//! across `/`, and `?` matches exactly one character.

use regex::Regex;

/// Characters that are regex metacharacters and must be escaped when they
/// appear literally in a glob pattern.
const REGEX_SPECIAL_CHARS: &str = ".^$[](){}+|\\";

/// A compiled selector pattern.
///
/// Matching is anchored (the whole relative path must match) and
/// case-sensitive; the case-insensitivity in this system applies only to
/// the base-path prefix check used to compute the relative path, not to
/// the pattern body itself.
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a glob pattern. Returns `None` (after logging a warning) if
    /// the translated regex fails to compile.
    pub fn compile(raw: &str) -> Option<Self> {
        let translated = translate_to_regex(raw);
        match Regex::new(&translated) {
            Ok(regex) => Some(Self {
                raw: raw.to_string(),
                regex,
            }),
            Err(e) => {
                tracing::warn!(
                    pattern = raw,
                    translated = %translated,
                    error = %e,
                    "invalid glob pattern; it will match nothing"
                );
                None
            }
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Test `path` against this pattern, computed relative to `base_dir`.
    ///
    /// If `path` (case-insensitively) starts with `base_dir`, the matched
    /// candidate is the remainder with a leading `/` stripped. Otherwise
    /// the candidate is `path` itself, unnormalized.
    pub fn matches_relative_to(&self, path: &str, base_dir: &str) -> bool {
        let path = normalize_separators(path);
        let base = normalize_separators(base_dir);
        let base = base.trim_end_matches('/');

        let candidate = if path.to_lowercase().starts_with(&base.to_lowercase()) {
            path[base.len()..].trim_start_matches('/').to_string()
        } else {
            path
        };

        self.regex.is_match(&candidate)
    }
}

fn normalize_separators(s: &str) -> String {
    s.replace('\\', "/")
}

/// Translate a glob pattern into an anchored regular expression following
/// the token table in the pattern-compiler specification.
fn translate_to_regex(pattern: &str) -> String {
    let pattern = normalize_separators(pattern);
    let chars: Vec<char> = pattern.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(len + 2);
    let mut at_start = true;
    let mut i = 0;

    while i < len {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let next2 = chars.get(i + 2).copied();

        match c {
            '*' => {
                if next == Some('*') {
                    if at_start && next2 == Some('/') {
                        out.push_str("(.*/)?");
                        i += 2;
                    } else {
                        out.push_str(".*");
                        i += 1;
                    }
                } else {
                    out.push_str("[^/]*");
                }
                at_start = false;
            }
            '?' => {
                out.push('.');
                at_start = false;
            }
            '/' => {
                out.push('/');
                // `at_start` is deliberately left alone: a `**/` occurring
                // right after a `/` still gets the "optional prefix" reading.
            }
            c if REGEX_SPECIAL_CHARS.contains(c) => {
                out.push('\\');
                out.push(c);
                at_start = false;
            }
            c => {
                out.push(c);
                at_start = false;
            }
        }
        i += 1;
    }

    format!("^{out}$")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str, base: &str) -> bool {
        Pattern::compile(pattern)
            .unwrap()
            .matches_relative_to(path, base)
    }

    #[test]
    fn star_excludes_slash() {
        assert!(matches("*.txt", "/proj/a.txt", "/proj"));
        assert!(!matches("*.txt", "/proj/sub/a.txt", "/proj"));
    }

    #[test]
    fn double_star_prefix_is_optional() {
        assert!(matches("**/a.txt", "/proj/a.txt", "/proj"));
        assert!(matches("**/a.txt", "/proj/x/y/a.txt", "/proj"));
    }

    #[test]
    fn double_star_elsewhere_crosses_slash() {
        assert!(matches("config/**", "/proj/config/x/y.json", "/proj"));
        assert!(matches("config/**", "/proj/config", "/proj"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(matches("a?.txt", "/proj/ab.txt", "/proj"));
        assert!(!matches("a?.txt", "/proj/abc.txt", "/proj"));
    }

    #[test]
    fn literal_regex_metachars_are_escaped() {
        assert!(matches("a+b.txt", "/proj/a+b.txt", "/proj"));
        assert!(!matches("a+b.txt", "/proj/aab.txt", "/proj"));
    }

    #[test]
    fn relative_path_is_stripped_of_base_case_insensitively() {
        assert!(matches("src/*.rs", "/Proj/src/main.rs", "/proj"));
    }

    #[test]
    fn path_outside_base_matches_raw_form() {
        // Path does not start with base_dir, so it is matched verbatim.
        assert!(matches("*.txt", "a.txt", "/unrelated/base"));
    }

    #[test]
    fn anchored_match_requires_full_path() {
        assert!(!matches("a.txt", "/proj/a.txt.bak", "/proj"));
    }

    #[test]
    fn invalid_pattern_compiles_to_none() {
        // Unbalanced escape sequences in the regex crate are rare since we
        // escape our own metacharacters, but an absurdly pathological
        // pattern (one made entirely of `?`) must still compile — this
        // asserts the happy path holds for an edge-shaped but valid input.
        assert!(Pattern::compile("???").is_some());
    }
}
