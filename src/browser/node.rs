//! Lazy tree nodes for the asset browser.
//!
//! A node knows its identity (local path, package reference, or category
//! tag) but defers building its children until first expansion or an
//! explicit force-build. Trees are discarded and rebuilt wholesale on
//! refresh or filter changes; identity keys are the only state that
//! survives a rebuild (the expansion store keeps them externally).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::browser::remote::{CategoryPages, ManifestCache, PackageRecord};

/// Identity-key scheme for remote packages: `pkg://<id>[/<subpath>]`.
pub const PACKAGE_KEY_PREFIX: &str = "pkg://";
/// Identity-key scheme for categories: `category://<tag>`.
pub const CATEGORY_KEY_PREFIX: &str = "category://";

const LOAD_MORE_SEGMENT: &str = "#load-more";
const LOAD_MORE_LABEL: &str = "Load more…";

// ── Exclusion rules ──────────────────────────────────────────────────────────

/// Entry exclusion rules applied when listing local directories.
///
/// Evaluated in precedence order: hidden attribute, build-artifact directory
/// name (directories only, case-insensitive), leading dot, generated marker
/// or metadata suffix (files only), compiled shadow (a file `X<suffix>` with
/// a sibling file literally named `X`).
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    pub artifact_dirs: Vec<String>,
    pub generated_marker: String,
    pub meta_suffix: String,
    pub compiled_suffix: String,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            artifact_dirs: vec!["cache".to_string(), "target".to_string()],
            generated_marker: ".generated".to_string(),
            meta_suffix: ".meta".to_string(),
            compiled_suffix: "_c".to_string(),
        }
    }
}

impl ExclusionRules {
    /// Decide whether one directory entry is excluded. `sibling_files` holds
    /// the plain file names of the same directory for the compiled-shadow
    /// test.
    pub fn excludes(
        &self,
        name: &str,
        is_dir: bool,
        is_hidden: bool,
        sibling_files: &HashSet<String>,
    ) -> bool {
        if is_hidden {
            return true;
        }
        if is_dir
            && self
                .artifact_dirs
                .iter()
                .any(|d| d.eq_ignore_ascii_case(name))
        {
            return true;
        }
        if name.starts_with('.') {
            return true;
        }
        if !is_dir {
            if name.contains(&self.generated_marker) || name.ends_with(&self.meta_suffix) {
                return true;
            }
            if let Some(stem) = name.strip_suffix(&self.compiled_suffix) {
                if !stem.is_empty() && sibling_files.contains(stem) {
                    return true;
                }
            }
        }
        false
    }
}

/// On Unix there is no hidden attribute bit; the leading-dot test stands in
/// for it (rules 1 and 3 coincide but keep their precedence slots).
pub fn entry_is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

// ── Identity keys ────────────────────────────────────────────────────────────

pub fn key_for_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn package_key(package: &str) -> String {
    format!("{PACKAGE_KEY_PREFIX}{package}")
}

pub fn category_key(tag: &str) -> String {
    format!("{CATEGORY_KEY_PREFIX}{tag}")
}

/// Whether `ancestor` is a strict key-prefix ancestor of `key`.
///
/// Keys are path-shaped; the character after the prefix must be a separator
/// so that `/a/b` is not treated as an ancestor of `/a/bc`.
pub fn is_key_ancestor(ancestor: &str, key: &str) -> bool {
    key.len() > ancestor.len()
        && key.starts_with(ancestor)
        && matches!(key.as_bytes()[ancestor.len()], b'/' | b'\\')
}

// ── Node ─────────────────────────────────────────────────────────────────────

/// Closed set of node kinds; all panel logic dispatches on this single
/// discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    LocalFolder,
    LocalFile,
    PackageFolder { package: String },
    PackageSubFolder { package: String, prefix: String },
    PackageFile { package: String, path: String },
    Category { tag: String },
    LoadMore { tag: String },
}

/// A node in the browser tree. `children` stays `None` until built.
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable identity, unique within the parent for one tree build.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub children: Option<Vec<Node>>,
    pub expanded: bool,
    pub depth: usize,
}

/// Read-only collaborators a node needs while building children or
/// evaluating a filter.
pub struct BuildContext<'a> {
    pub rules: &'a ExclusionRules,
    pub manifests: &'a ManifestCache,
    pub categories: &'a CategoryPages,
    /// Depth bound for filter scans below unbuilt nodes.
    pub scan_depth: usize,
}

impl Node {
    pub fn local_folder(path: &Path, depth: usize) -> Self {
        Self {
            key: key_for_path(path),
            name: display_name(path),
            kind: NodeKind::LocalFolder,
            children: None,
            expanded: false,
            depth,
        }
    }

    pub fn local_file(path: &Path, depth: usize) -> Self {
        Self {
            key: key_for_path(path),
            name: display_name(path),
            kind: NodeKind::LocalFile,
            children: None,
            expanded: false,
            depth,
        }
    }

    pub fn package(record: &PackageRecord, depth: usize) -> Self {
        Self {
            key: package_key(&record.id),
            name: record.name.clone(),
            kind: NodeKind::PackageFolder {
                package: record.id.clone(),
            },
            children: None,
            expanded: false,
            depth,
        }
    }

    pub fn category(tag: &str, label: &str, depth: usize) -> Self {
        Self {
            key: category_key(tag),
            name: label.to_string(),
            kind: NodeKind::Category {
                tag: tag.to_string(),
            },
            children: None,
            expanded: false,
            depth,
        }
    }

    fn load_more(tag: &str, depth: usize) -> Self {
        Self {
            key: format!("{}/{}", category_key(tag), LOAD_MORE_SEGMENT),
            name: LOAD_MORE_LABEL.to_string(),
            kind: NodeKind::LoadMore {
                tag: tag.to_string(),
            },
            children: None,
            expanded: false,
            depth,
        }
    }

    /// The local filesystem path for local node kinds.
    pub fn local_path(&self) -> Option<PathBuf> {
        match self.kind {
            NodeKind::LocalFolder | NodeKind::LocalFile => Some(PathBuf::from(&self.key)),
            _ => None,
        }
    }

    /// Whether this node sorts with the folder group.
    pub fn is_dir_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::LocalFolder
                | NodeKind::PackageFolder { .. }
                | NodeKind::PackageSubFolder { .. }
                | NodeKind::Category { .. }
        )
    }

    /// Cheap "could have children" probe; never materializes child nodes.
    pub fn has_children(&self, ctx: &BuildContext) -> bool {
        match &self.kind {
            NodeKind::LocalFolder => match fs::read_dir(Path::new(&self.key)) {
                Ok(mut entries) => entries.next().is_some(),
                Err(_) => false,
            },
            NodeKind::LocalFile | NodeKind::PackageFile { .. } | NodeKind::LoadMore { .. } => {
                false
            }
            // Unknown manifest counts as "potentially has children".
            NodeKind::PackageFolder { package } => ctx
                .manifests
                .get(package)
                .map(|files| !files.is_empty())
                .unwrap_or(true),
            NodeKind::PackageSubFolder { .. } => true,
            NodeKind::Category { .. } => true,
        }
    }

    /// Build (or rebuild) the ordered child sequence. Idempotent: calling it
    /// again reconstructs from the current collaborator state, so it can be
    /// retried after a failed listing or a manifest arriving late.
    pub fn build_children(&mut self, ctx: &BuildContext) {
        let depth = self.depth + 1;
        let children = match &self.kind {
            NodeKind::LocalFolder => {
                list_local_children(Path::new(&self.key), depth, ctx.rules)
            }
            NodeKind::LocalFile | NodeKind::PackageFile { .. } | NodeKind::LoadMore { .. } => {
                Vec::new()
            }
            NodeKind::PackageFolder { package } => match ctx.manifests.get(package) {
                Some(files) => group_package_files(package, "", files, depth),
                // Manifest not fetched yet; the panel rebuilds once it lands.
                None => Vec::new(),
            },
            NodeKind::PackageSubFolder { package, prefix } => match ctx.manifests.get(package) {
                Some(files) => group_package_files(package, prefix, files, depth),
                None => Vec::new(),
            },
            NodeKind::Category { tag } => category_children(tag, ctx.categories, depth),
        };
        self.children = Some(children);
    }

    /// Build children only if they have not been built this tree generation.
    pub fn ensure_children_built(&mut self, ctx: &BuildContext) {
        if self.children.is_none() {
            self.build_children(ctx);
        }
    }

    /// Discard built children (next ensure rebuilds them).
    pub fn clear_children(&mut self) {
        self.children = None;
    }

    /// Recursive descent to the node with the given identity key, forcing
    /// children to be built along the path. Only descends into a child whose
    /// key is a prefix of the target key.
    pub fn find_node(&mut self, key: &str, ctx: &BuildContext) -> Option<&mut Node> {
        if self.key == key {
            return Some(self);
        }
        if !is_key_ancestor(&self.key, key) {
            return None;
        }
        self.ensure_children_built(ctx);
        for child in self.children.as_mut()?.iter_mut() {
            if let Some(found) = child.find_node(key, ctx) {
                return Some(found);
            }
        }
        None
    }

    /// Whether this node or anything below it matches the query
    /// (case-insensitive substring). Built subtrees are checked node by
    /// node; unbuilt subtrees are scanned directly without instantiating
    /// child nodes, bounded by `ctx.scan_depth`.
    pub fn matches_filter(&self, query_lower: &str, ctx: &BuildContext) -> bool {
        if self.name.to_lowercase().contains(query_lower) {
            return true;
        }
        if let Some(children) = &self.children {
            return children.iter().any(|c| c.matches_filter(query_lower, ctx));
        }
        match &self.kind {
            NodeKind::LocalFolder => scan_local_for_match(
                Path::new(&self.key),
                query_lower,
                ctx.rules,
                ctx.scan_depth,
            ),
            NodeKind::PackageFolder { package } => {
                manifest_scan(ctx.manifests.get(package), "", query_lower)
            }
            NodeKind::PackageSubFolder { package, prefix } => {
                manifest_scan(ctx.manifests.get(package), prefix, query_lower)
            }
            NodeKind::Category { tag } => ctx
                .categories
                .get(tag)
                .map(|state| {
                    state
                        .loaded
                        .iter()
                        .any(|p| p.name.to_lowercase().contains(query_lower))
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// ── Child construction ───────────────────────────────────────────────────────

/// Folders before files, case-insensitive within each group; load-more
/// sentinels trail everything.
pub fn sort_children(children: &mut [Node]) {
    fn rank(node: &Node) -> u8 {
        match node.kind {
            NodeKind::LoadMore { .. } => 2,
            _ if node.is_dir_like() => 0,
            _ => 1,
        }
    }
    children.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// List one local directory into child nodes, applying exclusion rules.
/// Listing failures are logged and yield an empty sequence; unreadable
/// entries are skipped.
fn list_local_children(path: &Path, depth: usize, rules: &ExclusionRules) -> Vec<Node> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %path.display(), %err, "directory listing failed, treating as empty");
            return Vec::new();
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

    let mut children = Vec::new();
    for (name, is_dir, entry_path) in raw {
        if rules.excludes(&name, is_dir, entry_is_hidden(&name), &sibling_files) {
            continue;
        }
        children.push(if is_dir {
            Node::local_folder(&entry_path, depth)
        } else {
            Node::local_file(&entry_path, depth)
        });
    }
    sort_children(&mut children);
    children
}

/// Group a package manifest's paths under `prefix` into sub-folders (first
/// segment) and direct files.
fn group_package_files(package: &str, prefix: &str, files: &[String], depth: usize) -> Vec<Node> {
    let mut sub_dirs: Vec<String> = Vec::new();
    let mut children = Vec::new();

    for file in files {
        let Some(rest) = file.strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        match rest.split_once('/') {
            Some((segment, _)) if !segment.is_empty() => {
                if !sub_dirs.iter().any(|d| d == segment) {
                    sub_dirs.push(segment.to_string());
                }
            }
            _ => {
                children.push(Node {
                    key: format!("{}/{}", package_key(package), file),
                    name: rest.to_string(),
                    kind: NodeKind::PackageFile {
                        package: package.to_string(),
                        path: file.clone(),
                    },
                    children: None,
                    expanded: false,
                    depth,
                });
            }
        }
    }

    for segment in sub_dirs {
        let sub_prefix = format!("{prefix}{segment}/");
        children.push(Node {
            key: format!(
                "{}/{}",
                package_key(package),
                sub_prefix.trim_end_matches('/')
            ),
            name: segment,
            kind: NodeKind::PackageSubFolder {
                package: package.to_string(),
                prefix: sub_prefix,
            },
            children: None,
            expanded: false,
            depth,
        });
    }

    sort_children(&mut children);
    children
}

/// A category's children: the loaded pages in server order, plus a trailing
/// load-more sentinel until the category is exhausted.
fn category_children(tag: &str, categories: &CategoryPages, depth: usize) -> Vec<Node> {
    let mut children = Vec::new();
    let exhausted = match categories.get(tag) {
        Some(state) => {
            for record in &state.loaded {
                children.push(Node::package(record, depth));
            }
            state.exhausted
        }
        None => false,
    };
    if !exhausted {
        children.push(Node::load_more(tag, depth));
    }
    children
}

/// Bounded-depth scan of a local subtree for a name match, without creating
/// node objects. Per-directory errors terminate that branch only.
fn scan_local_for_match(
    path: &Path,
    query_lower: &str,
    rules: &ExclusionRules,
    depth_remaining: usize,
) -> bool {
    if depth_remaining == 0 {
        return false;
    }
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return false,
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

    for (name, is_dir, entry_path) in raw {
        if rules.excludes(&name, is_dir, entry_is_hidden(&name), &sibling_files) {
            continue;
        }
        if name.to_lowercase().contains(query_lower) {
            return true;
        }
        if is_dir && scan_local_for_match(&entry_path, query_lower, rules, depth_remaining - 1) {
            return true;
        }
    }
    false
}

fn manifest_scan(files: Option<&[String]>, prefix: &str, query_lower: &str) -> bool {
    files
        .map(|files| {
            files.iter().any(|file| {
                file.strip_prefix(prefix)
                    .is_some_and(|rest| rest.to_lowercase().contains(query_lower))
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::remote::CategoryState;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn ctx<'a>(
        rules: &'a ExclusionRules,
        manifests: &'a ManifestCache,
        categories: &'a CategoryPages,
    ) -> BuildContext<'a> {
        BuildContext {
            rules,
            manifests,
            categories,
            scan_depth: 15,
        }
    }

    fn empty_ctx_parts() -> (ExclusionRules, ManifestCache, CategoryPages) {
        (
            ExclusionRules::default(),
            ManifestCache::default(),
            CategoryPages::default(),
        )
    }

    fn child_names(node: &Node) -> Vec<&str> {
        node.children
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    // ── Exclusion rules ──

    #[test]
    fn compiled_shadow_hidden_when_source_present() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("tree.mdl")).unwrap();
        File::create(dir.path().join("tree.mdl_c")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let mut root = Node::local_folder(dir.path(), 0);
        root.build_children(&ctx(&rules, &manifests, &categories));

        assert_eq!(child_names(&root), vec!["tree.mdl"]);
    }

    #[test]
    fn lone_compiled_file_is_kept() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("tree.mdl_c")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let mut root = Node::local_folder(dir.path(), 0);
        root.build_children(&ctx(&rules, &manifests, &categories));

        assert_eq!(child_names(&root), vec!["tree.mdl_c"]);
    }

    #[test]
    fn dotfiles_meta_and_artifact_dirs_excluded() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        File::create(dir.path().join("scene.meta")).unwrap();
        File::create(dir.path().join("atlas.generated.png")).unwrap();
        fs::create_dir(dir.path().join("Cache")).unwrap();
        File::create(dir.path().join("keep.txt")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let mut root = Node::local_folder(dir.path(), 0);
        root.build_children(&ctx(&rules, &manifests, &categories));

        assert_eq!(child_names(&root), vec!["keep.txt"]);
    }

    #[test]
    fn artifact_dir_rule_applies_to_directories_only() {
        let dir = TempDir::new().unwrap();
        // A *file* named like the artifact dir is not excluded by rule 2.
        File::create(dir.path().join("cache")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let mut root = Node::local_folder(dir.path(), 0);
        root.build_children(&ctx(&rules, &manifests, &categories));

        assert_eq!(child_names(&root), vec!["cache"]);
    }

    // ── Ordering ──

    #[test]
    fn folders_first_case_insensitive_within_groups() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("B")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("C")).unwrap();
        File::create(dir.path().join("z")).unwrap();
        File::create(dir.path().join("A")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let mut root = Node::local_folder(dir.path(), 0);
        root.build_children(&ctx(&rules, &manifests, &categories));

        assert_eq!(child_names(&root), vec!["a", "B", "C", "A", "z"]);
    }

    // ── Laziness ──

    #[test]
    fn children_deferred_until_built() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("file.txt")).unwrap();

        let node = Node::local_folder(dir.path(), 0);
        assert!(node.children.is_none());
    }

    #[test]
    fn ensure_builds_at_most_once_per_generation() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a.txt")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        let mut node = Node::local_folder(dir.path(), 0);
        node.ensure_children_built(&build_ctx);
        assert_eq!(child_names(&node).len(), 1);

        // New entry on disk is not picked up by ensure...
        File::create(dir.path().join("b.txt")).unwrap();
        node.ensure_children_built(&build_ctx);
        assert_eq!(child_names(&node).len(), 1);

        // ...but a rebuild after clear reconstructs the sequence.
        node.clear_children();
        node.ensure_children_built(&build_ctx);
        assert_eq!(child_names(&node).len(), 2);
    }

    #[test]
    fn build_children_retries_after_vanished_path() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let mut node = Node::local_folder(&sub, 0);
        fs::remove_dir(&sub).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        // Vanished path is "no children", not an error.
        node.build_children(&build_ctx);
        assert!(node.children.as_ref().unwrap().is_empty());

        fs::create_dir(&sub).unwrap();
        File::create(sub.join("back.txt")).unwrap();
        node.build_children(&build_ctx);
        assert_eq!(child_names(&node), vec!["back.txt"]);
    }

    // ── has_children ──

    #[test]
    fn has_children_probes_without_materializing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("full")).unwrap();
        File::create(dir.path().join("full").join("x")).unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);

        let full = Node::local_folder(&dir.path().join("full"), 0);
        let empty = Node::local_folder(&dir.path().join("empty"), 0);
        assert!(full.has_children(&build_ctx));
        assert!(!empty.has_children(&build_ctx));
        assert!(full.children.is_none());
    }

    #[test]
    fn category_always_reports_children() {
        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        let node = Node::category("model", "Models", 0);
        assert!(node.has_children(&build_ctx));
    }

    #[test]
    fn package_without_manifest_reports_potential_children() {
        let (rules, mut manifests, categories) = empty_ctx_parts();
        let record = PackageRecord {
            id: "p1".into(),
            name: "P1".into(),
            category: String::new(),
        };
        let node = Node::package(&record, 0);
        assert!(node.has_children(&ctx(&rules, &manifests, &categories)));

        manifests.insert("p1", Vec::new());
        assert!(!node.has_children(&ctx(&rules, &manifests, &categories)));
    }

    // ── Package grouping ──

    #[test]
    fn manifest_grouped_by_first_segment() {
        let (rules, mut manifests, categories) = empty_ctx_parts();
        manifests.insert(
            "p1",
            vec![
                "textures/wood.png".to_string(),
                "textures/stone.png".to_string(),
                "readme.txt".to_string(),
                "models/props/crate.mdl".to_string(),
            ],
        );
        let build_ctx = ctx(&rules, &manifests, &categories);

        let record = PackageRecord {
            id: "p1".into(),
            name: "P1".into(),
            category: String::new(),
        };
        let mut pkg = Node::package(&record, 0);
        pkg.build_children(&build_ctx);
        assert_eq!(child_names(&pkg), vec!["models", "textures", "readme.txt"]);

        let textures = &mut pkg.children.as_mut().unwrap()[1];
        assert_eq!(textures.key, "pkg://p1/textures");
        textures.build_children(&build_ctx);
        assert_eq!(child_names(textures), vec!["stone.png", "wood.png"]);
    }

    #[test]
    fn nested_sub_folders_group_recursively() {
        let (rules, mut manifests, categories) = empty_ctx_parts();
        manifests.insert("p1", vec!["models/props/crate.mdl".to_string()]);
        let build_ctx = ctx(&rules, &manifests, &categories);

        let record = PackageRecord {
            id: "p1".into(),
            name: "P1".into(),
            category: String::new(),
        };
        let mut pkg = Node::package(&record, 0);
        pkg.build_children(&build_ctx);
        let models = &mut pkg.children.as_mut().unwrap()[0];
        models.build_children(&build_ctx);
        assert_eq!(child_names(models), vec!["props"]);

        let props = &mut models.children.as_mut().unwrap()[0];
        assert_eq!(props.key, "pkg://p1/models/props");
        props.build_children(&build_ctx);
        assert_eq!(child_names(props), vec!["crate.mdl"]);
    }

    // ── Category children ──

    #[test]
    fn unloaded_category_has_only_sentinel() {
        let (rules, manifests, categories) = empty_ctx_parts();
        let mut node = Node::category("model", "Models", 0);
        node.build_children(&ctx(&rules, &manifests, &categories));

        let children = node.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0].kind, NodeKind::LoadMore { .. }));
    }

    #[test]
    fn loaded_category_keeps_server_order_with_trailing_sentinel() {
        let (rules, manifests, mut categories) = empty_ctx_parts();
        let mut state = CategoryState::default();
        let token = state.begin_fetch().unwrap();
        state.apply_page(
            token,
            vec![
                PackageRecord {
                    id: "zeta".into(),
                    name: "Zeta".into(),
                    category: "model".into(),
                },
                PackageRecord {
                    id: "alpha".into(),
                    name: "Alpha".into(),
                    category: "model".into(),
                },
            ],
            2,
        );
        categories.insert("model".to_string(), state);

        let mut node = Node::category("model", "Models", 0);
        node.build_children(&ctx(&rules, &manifests, &categories));
        assert_eq!(child_names(&node), vec!["Zeta", "Alpha", LOAD_MORE_LABEL]);
    }

    #[test]
    fn exhausted_category_drops_sentinel() {
        let (rules, manifests, mut categories) = empty_ctx_parts();
        let mut state = CategoryState::default();
        let token = state.begin_fetch().unwrap();
        state.apply_page(
            token,
            vec![PackageRecord {
                id: "only".into(),
                name: "Only".into(),
                category: "model".into(),
            }],
            10,
        );
        categories.insert("model".to_string(), state);

        let mut node = Node::category("model", "Models", 0);
        node.build_children(&ctx(&rules, &manifests, &categories));
        assert_eq!(child_names(&node), vec!["Only"]);
    }

    // ── find_node ──

    #[test]
    fn find_node_forces_builds_along_the_path() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("leaf.txt")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        let mut root = Node::local_folder(dir.path(), 0);

        let target = key_for_path(&deep.join("leaf.txt"));
        let found = root.find_node(&target, &build_ctx);
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "leaf.txt");
    }

    #[test]
    fn find_node_skips_non_ancestor_subtrees() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("other")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        let mut root = Node::local_folder(dir.path(), 0);
        root.ensure_children_built(&build_ctx);

        let target = key_for_path(&dir.path().join("a"));
        root.find_node(&target, &build_ctx);

        // The sibling was never descended into, so its children stay unbuilt.
        let other = root
            .children
            .as_ref()
            .unwrap()
            .iter()
            .find(|c| c.name == "other")
            .unwrap();
        assert!(other.children.is_none());
    }

    // ── matches_filter ──

    #[test]
    fn filter_scans_unbuilt_subtrees_without_nodes() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("sub").join("deeper");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("needle.txt")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let build_ctx = ctx(&rules, &manifests, &categories);
        let root = Node::local_folder(dir.path(), 0);

        assert!(root.matches_filter("needle", &build_ctx));
        assert!(!root.matches_filter("zzz-absent", &build_ctx));
        assert!(root.children.is_none());
    }

    #[test]
    fn filter_scan_respects_depth_bound() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("l1").join("l2").join("l3");
        fs::create_dir_all(&deep).unwrap();
        File::create(deep.join("needle.txt")).unwrap();

        let (rules, manifests, categories) = empty_ctx_parts();
        let shallow = BuildContext {
            rules: &rules,
            manifests: &manifests,
            categories: &categories,
            scan_depth: 2,
        };
        let root = Node::local_folder(dir.path(), 0);
        assert!(!root.matches_filter("needle", &shallow));

        let deep_enough = ctx(&rules, &manifests, &categories);
        assert!(root.matches_filter("needle", &deep_enough));
    }

    #[test]
    fn filter_checks_manifest_below_unbuilt_package() {
        let (rules, mut manifests, categories) = empty_ctx_parts();
        manifests.insert("p1", vec!["sounds/thunder.wav".to_string()]);
        let build_ctx = ctx(&rules, &manifests, &categories);

        let record = PackageRecord {
            id: "p1".into(),
            name: "Weather".into(),
            category: String::new(),
        };
        let pkg = Node::package(&record, 0);
        assert!(pkg.matches_filter("thunder", &build_ctx));
        assert!(!pkg.matches_filter("lava", &build_ctx));
    }

    // ── Identity keys ──

    #[test]
    fn key_ancestry_requires_separator_boundary() {
        assert!(is_key_ancestor("/proj/assets", "/proj/assets/tree.mdl"));
        assert!(!is_key_ancestor("/proj/assets", "/proj/assets2/tree.mdl"));
        assert!(!is_key_ancestor("/proj/assets", "/proj/assets"));
        assert!(is_key_ancestor("pkg://p1", "pkg://p1/textures/wood.png"));
        assert!(is_key_ancestor("category://model", "category://model/#load-more"));
    }
}
