//! Filter index: resolves a free-text query against local roots without
//! constructing node objects.
//!
//! The match set is computed once per query execution and consulted as an
//! O(1) membership test while rendering; recomputing per paint would re-scan
//! the filesystem quadratically. Ancestors of every match are included so
//! matched leaves stay reachable in the pruned tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::browser::node::{entry_is_hidden, key_for_path, ExclusionRules};

/// Default recursion bound for the match walk.
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// Compute the set of identity keys under `roots` whose names contain
/// `query` (case-insensitive substring), plus every ancestor directory of a
/// match up to and including the root.
pub fn compute_matches(
    roots: &[PathBuf],
    query: &str,
    rules: &ExclusionRules,
    max_depth: usize,
) -> HashSet<String> {
    let mut matches = HashSet::new();
    let query_lower = query.to_lowercase();
    if query_lower.is_empty() {
        return matches;
    }
    for root in roots {
        if walk(root, &query_lower, rules, max_depth, &mut matches) {
            matches.insert(key_for_path(root));
        }
    }
    matches
}

/// Walk one directory level. Returns whether this subtree contained any
/// match; failures are logged and end this branch only.
fn walk(
    dir: &Path,
    query_lower: &str,
    rules: &ExclusionRules,
    depth_remaining: usize,
    matches: &mut HashSet<String>,
) -> bool {
    if depth_remaining == 0 {
        return false;
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %dir.display(), %err, "match walk skipped unreadable directory");
            return false;
        }
    };

    let mut raw: Vec<(String, bool, PathBuf)> = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();
        raw.push((name, file_type.is_dir(), entry.path()));
    }
    let sibling_files: HashSet<String> = raw
        .iter()
        .filter(|(_, is_dir, _)| !is_dir)
        .map(|(name, _, _)| name.clone())
        .collect();

    let mut any = false;
    for (name, is_dir, path) in raw {
        if rules.excludes(&name, is_dir, entry_is_hidden(&name), &sibling_files) {
            continue;
        }
        if name.to_lowercase().contains(query_lower) {
            matches.insert(key_for_path(&path));
            any = true;
        }
        if is_dir && walk(&path, query_lower, rules, depth_remaining - 1, matches) {
            // Ancestor of a deeper match: keep it reachable.
            matches.insert(key_for_path(&path));
            any = true;
        }
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn ancestors_of_a_match_are_included() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("sub").join("deep");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("match.txt")).unwrap();

        let rules = ExclusionRules::default();
        let matches = compute_matches(
            &[dir.path().to_path_buf()],
            "match",
            &rules,
            DEFAULT_MAX_DEPTH,
        );

        assert!(matches.contains(&key_for_path(&deep.join("match.txt"))));
        assert!(matches.contains(&key_for_path(&deep)));
        assert!(matches.contains(&key_for_path(&dir.path().join("sub"))));
        assert!(matches.contains(&key_for_path(dir.path())));
    }

    #[test]
    fn matching_directory_names_are_collected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("textures")).unwrap();

        let rules = ExclusionRules::default();
        let matches = compute_matches(
            &[dir.path().to_path_buf()],
            "TEXT",
            &rules,
            DEFAULT_MAX_DEPTH,
        );

        assert!(matches.contains(&key_for_path(&dir.path().join("textures"))));
        assert!(matches.contains(&key_for_path(dir.path())));
    }

    #[test]
    fn excluded_entries_never_match() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("scene.meta")).unwrap();
        File::create(dir.path().join("scene.mdl")).unwrap();
        File::create(dir.path().join("scene.mdl_c")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        File::create(dir.path().join(".git").join("scene-ref")).unwrap();

        let rules = ExclusionRules::default();
        let matches = compute_matches(
            &[dir.path().to_path_buf()],
            "scene",
            &rules,
            DEFAULT_MAX_DEPTH,
        );

        assert!(matches.contains(&key_for_path(&dir.path().join("scene.mdl"))));
        assert!(!matches.contains(&key_for_path(&dir.path().join("scene.meta"))));
        assert!(!matches.contains(&key_for_path(&dir.path().join("scene.mdl_c"))));
        assert!(!matches.contains(&key_for_path(&dir.path().join(".git").join("scene-ref"))));
    }

    #[test]
    fn empty_query_yields_empty_set() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("anything.txt")).unwrap();

        let rules = ExclusionRules::default();
        let matches = compute_matches(&[dir.path().to_path_buf()], "", &rules, DEFAULT_MAX_DEPTH);
        assert!(matches.is_empty());
    }

    #[test]
    fn depth_bound_limits_the_walk() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("l1").join("l2").join("l3");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("needle.txt")).unwrap();

        let rules = ExclusionRules::default();
        let shallow = compute_matches(&[dir.path().to_path_buf()], "needle", &rules, 3);
        assert!(shallow.is_empty());

        let full = compute_matches(&[dir.path().to_path_buf()], "needle", &rules, 4);
        assert!(full.contains(&key_for_path(&deep.join("needle.txt"))));
    }

    #[test]
    fn unreadable_root_yields_empty_set() {
        let rules = ExclusionRules::default();
        let matches = compute_matches(
            &[PathBuf::from("/nonexistent/hangar-test-root")],
            "x",
            &rules,
            DEFAULT_MAX_DEPTH,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn one_failing_root_does_not_abort_others() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("found.txt")).unwrap();

        let rules = ExclusionRules::default();
        let roots = vec![
            PathBuf::from("/nonexistent/hangar-test-root"),
            dir.path().to_path_buf(),
        ];
        let matches = compute_matches(&roots, "found", &rules, DEFAULT_MAX_DEPTH);
        assert!(matches.contains(&key_for_path(&dir.path().join("found.txt"))));
    }
}
