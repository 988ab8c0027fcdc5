//! Hierarchical policy resolution for a target path.

use std::path::{Component, Path, PathBuf};

use crate::merge::{merge_hierarchical, merge_same_directory};
use crate::policy::{parse_marker_file, Policy, LOCAL_MARKER_FILE_NAME, MARKER_FILE_NAME};

/// `true` if any component of `path` is exactly `..`.
pub fn has_traversal(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// Load and same-directory-merge the policy rooted at exactly `dir`
/// (does not look at parents). Returns `None` if neither marker file
/// exists in `dir`.
fn load_directory_policy(dir: &Path) -> Option<Policy> {
    let main = parse_marker_file(&dir.join(MARKER_FILE_NAME));
    let local = parse_marker_file(&dir.join(LOCAL_MARKER_FILE_NAME));
    if main.is_none() && local.is_none() {
        return None;
    }
    let main = main.unwrap_or_else(|| {
        Policy::block_all(dir.join(MARKER_FILE_NAME).display().to_string(), None)
            .with_base_dir(dir.display().to_string())
    });
    Some(merge_same_directory(main, local))
}

/// Cheap existence-only check used by the orchestrator's fast-reject path:
/// is there a `.block`/`.block.local` anywhere on `dir`'s ancestor chain
/// (`dir` included)?
pub fn any_marker_on_ancestor_chain(dir: &Path) -> bool {
    let mut current = Some(dir);
    while let Some(d) = current {
        if d.join(MARKER_FILE_NAME).is_file() || d.join(LOCAL_MARKER_FILE_NAME).is_file() {
            return true;
        }
        current = d.parent();
    }
    false
}

/// Resolve the effective policy governing `target`, walking from
/// `dirname(target)` up to the filesystem root. Returns `None` if the path
/// contains a `..` segment or no marker file is found anywhere upward.
pub fn resolve_policy_for_path(target: &Path) -> Option<Policy> {
    if has_traversal(target) {
        return None;
    }

    let start_dir = target.parent()?;
    let mut contributions = Vec::new();
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        if let Some(policy) = load_directory_policy(dir) {
            contributions.push(policy);
        }
        current = dir.parent();
    }

    let mut iter = contributions.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |child, parent| merge_hierarchical(child, parent)))
}

/// The two extra, independently-evaluated policies considered when the
/// candidate path is itself an existing directory: the policy declared
/// inside that directory, and the first marker file found on any
/// descendant path (order-preserving sweep).
pub fn directory_target_extra_policies(target_dir: &Path) -> Vec<Policy> {
    let mut out = Vec::new();

    if let Some(inside) = load_directory_policy(target_dir) {
        out.push(inside);
    }

    if let Some(marker_path) = find_first_descendant_marker(target_dir) {
        let origin = marker_path.display().to_string();
        out.push(Policy::block_all(
            origin.clone(),
            Some(format!(
                "refusing to modify a directory that contains a protected marker file at {origin}"
            )),
        ));
    }

    out
}

/// Depth-first, lexically-ordered search for the first `.block`/`.block.local`
/// strictly below `dir`. Unreadable subdirectories are skipped silently
/// (callers only get a best-effort existence signal here).
fn find_first_descendant_marker(dir: &Path) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for entry in &entries {
        if entry.is_file() {
            if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                if crate::policy::is_marker_file_name(name) {
                    return Some(entry.clone());
                }
            }
        }
    }

    for entry in &entries {
        if entry.is_dir() {
            if let Some(found) = find_first_descendant_marker(entry) {
                return Some(found);
            }
        }
    }

    None
}
