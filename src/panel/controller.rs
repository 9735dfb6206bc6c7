//! Panel controller: one browsing surface over the shared tree machinery.
//!
//! A controller owns its forest of roots, its expansion store, its search
//! session, and (for cloud panels) its category page state. The flattened
//! row list is the only thing the widgets see; everything else is rebuilt
//! from identity keys whenever the underlying data changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::expansion::ExpansionStore;
use crate::browser::node::{key_for_path, BuildContext, Node, NodeKind};
use crate::browser::remote::{CategoryPages, CategoryState, PackageRecord};
use crate::browser::search::SearchSession;
use crate::browser::BrowserEnv;
use crate::config::CategoryConfig;
use crate::persist::StateStore;

/// What a panel instance shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Hierarchical tree over the local roots.
    Tree,
    /// Flat grid over one folder or one loaded package set.
    Grid,
    /// Tree of remote categories and packages.
    CloudTree,
}

/// Cross-panel notifications fanned out by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    FolderSelected(PathBuf),
    FileSelected(PathBuf),
    PackagesLoaded(String),
}

/// Follow-up work the app must do after an activation.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    None,
    OpenFile(PathBuf),
    OpenPackageFile {
        package: String,
        path: String,
    },
    FetchManifest {
        package: String,
    },
    FetchPage {
        tag: String,
        offset: usize,
        generation: u64,
    },
}

/// One visible line of the panel, in paint order.
#[derive(Debug, Clone)]
pub struct Row {
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub expanded: bool,
    pub has_children: bool,
    pub is_last_sibling: bool,
}

pub struct PanelController {
    pub id: String,
    pub kind: PanelKind,
    root_paths: Vec<PathBuf>,
    categories_cfg: Vec<CategoryConfig>,
    roots: Vec<Node>,
    /// Page state for categories shown by this panel.
    pub categories: CategoryPages,
    pub expansion: ExpansionStore,
    pub search: SearchSession,
    pub rows: Vec<Row>,
    pub selected: usize,
    pub scroll: usize,
}

impl PanelController {
    /// Build a panel over local roots (`Tree`/`Grid`) or remote categories
    /// (`CloudTree`). Saved expansion state for `id` is restored from the
    /// store on the first `rebuild`.
    pub fn new(
        id: impl Into<String>,
        kind: PanelKind,
        root_paths: Vec<PathBuf>,
        categories_cfg: Vec<CategoryConfig>,
        store: &StateStore,
    ) -> Self {
        let id = id.into();
        let expansion = ExpansionStore::load(&id, store);
        Self {
            id,
            kind,
            root_paths,
            categories_cfg,
            roots: Vec::new(),
            categories: CategoryPages::default(),
            expansion,
            search: SearchSession::new(),
            rows: Vec::new(),
            selected: 0,
            scroll: 0,
        }
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn local_roots(&self) -> &[PathBuf] {
        &self.root_paths
    }

    /// The configured display label for a category tag.
    pub fn category_label(&self, tag: &str) -> Option<&str> {
        self.categories_cfg
            .iter()
            .find(|c| c.tag == tag)
            .map(|c| c.label.as_str())
    }

    /// Discard the forest, rebuild it from the current collaborators, replay
    /// expansion, and reflatten. Selection sticks to its identity key when
    /// the key survives the rebuild.
    pub fn rebuild(&mut self, env: &BrowserEnv) {
        let selected_key = self.selected_row().map(|r| r.key.clone());

        self.roots = match self.kind {
            PanelKind::Tree | PanelKind::Grid => self
                .root_paths
                .iter()
                .map(|p| Node::local_folder(p, 0))
                .collect(),
            PanelKind::CloudTree => {
                for cfg in &self.categories_cfg {
                    self.categories.entry(cfg.tag.clone()).or_default();
                }
                self.categories_cfg
                    .iter()
                    .map(|cfg| Node::category(&cfg.tag, &cfg.label, 0))
                    .collect()
            }
        };

        let saved = self.expansion.snapshot();
        {
            let ctx = env.context(&self.categories);
            for root in &mut self.roots {
                root.ensure_children_built(&ctx);
                root.expanded = true;
            }
            ExpansionStore::restore(&mut self.roots, &saved, &ctx);
        }
        self.flatten(env);

        if let Some(key) = selected_key {
            if let Some(index) = self.rows.iter().position(|r| r.key == key) {
                self.selected = index;
            }
        }
        self.clamp_selection();
    }

    /// Recompute the visible row list from the current forest.
    pub fn flatten(&mut self, env: &BrowserEnv) {
        let ctx = env.context(&self.categories);
        let mut rows = Vec::new();
        let search = &self.search;
        for root in &mut self.roots {
            flatten_node(root, &ctx, search, true, &mut rows);
        }
        self.rows = rows;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.rows.len() {
            self.selected = self.rows.len() - 1;
        }
    }

    // ── Selection ────────────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_key(&mut self, key: &str) {
        if let Some(index) = self.rows.iter().position(|r| r.key == key) {
            self.selected = index;
        }
    }

    /// Keep the selection inside a viewport of `visible_height` rows.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + visible_height {
            self.scroll = self.selected + 1 - visible_height;
        }
    }

    // ── Expand / collapse ────────────────────────────────────────────────────

    /// Expand the selected node. The expansion store is updated immediately;
    /// persistence happens later on the debounce tick.
    pub fn expand_selected(&mut self, env: &BrowserEnv) {
        let Some(key) = self.selected_row().map(|r| r.key.clone()) else {
            return;
        };
        {
            let ctx = env.context(&self.categories);
            for root in &mut self.roots {
                if let Some(node) = root.find_node(&key, &ctx) {
                    if !node.is_dir_like() {
                        return;
                    }
                    node.ensure_children_built(&ctx);
                    node.expanded = true;
                    break;
                }
            }
        }
        self.expansion.on_expanded(&key);
        self.flatten(env);
    }

    pub fn collapse_selected(&mut self, env: &BrowserEnv) {
        let Some(key) = self.selected_row().map(|r| r.key.clone()) else {
            return;
        };
        {
            let ctx = env.context(&self.categories);
            for root in &mut self.roots {
                if let Some(node) = root.find_node(&key, &ctx) {
                    node.expanded = false;
                    break;
                }
            }
        }
        self.expansion.on_collapsed(&key);
        self.flatten(env);
    }

    // ── Activation ───────────────────────────────────────────────────────────

    /// Act on the selected row. Returns the async follow-up plus the events
    /// to fan out to sibling panels.
    pub fn activate_selected(&mut self, env: &BrowserEnv) -> (Activation, Vec<PanelEvent>) {
        let Some(row) = self.selected_row() else {
            return (Activation::None, Vec::new());
        };
        let key = row.key.clone();
        let kind = row.kind.clone();
        let expanded = row.expanded;

        match kind {
            NodeKind::LocalFile => {
                let path = PathBuf::from(&key);
                (
                    Activation::OpenFile(path.clone()),
                    vec![PanelEvent::FileSelected(path)],
                )
            }
            NodeKind::LocalFolder => {
                let path = PathBuf::from(&key);
                if expanded {
                    self.collapse_selected(env);
                } else {
                    self.expand_selected(env);
                }
                (Activation::None, vec![PanelEvent::FolderSelected(path)])
            }
            NodeKind::Category { .. } | NodeKind::PackageSubFolder { .. } => {
                if expanded {
                    self.collapse_selected(env);
                } else {
                    self.expand_selected(env);
                }
                (Activation::None, Vec::new())
            }
            NodeKind::PackageFolder { package } => {
                if env.manifests.contains(&package) {
                    if expanded {
                        self.collapse_selected(env);
                    } else {
                        self.expand_selected(env);
                    }
                    (Activation::None, Vec::new())
                } else {
                    // Expand optimistically; the subtree fills in when the
                    // manifest lands.
                    self.expand_selected(env);
                    (Activation::FetchManifest { package }, Vec::new())
                }
            }
            NodeKind::PackageFile { package, path } => (
                Activation::OpenPackageFile { package, path },
                Vec::new(),
            ),
            NodeKind::LoadMore { tag } => {
                let state = self.categories.entry(tag.clone()).or_default();
                match state.begin_fetch() {
                    Some(generation) => (
                        Activation::FetchPage {
                            tag,
                            offset: state.next_offset,
                            generation,
                        },
                        Vec::new(),
                    ),
                    // A fetch is already in flight; the trigger is inert.
                    None => (Activation::None, Vec::new()),
                }
            }
        }
    }

    /// Apply a fetched category page. Returns `true` when the page landed
    /// (fresh generation) and the tree was rebuilt around it.
    pub fn apply_package_page(
        &mut self,
        tag: &str,
        generation: u64,
        page: Vec<PackageRecord>,
        page_size: usize,
        env: &BrowserEnv,
    ) -> bool {
        let Some(state) = self.categories.get_mut(tag) else {
            return false;
        };
        if !state.apply_page(generation, page, page_size) {
            return false;
        }
        self.refresh_category(tag, env);
        true
    }

    /// Mark an in-flight category fetch as failed; loaded pages are kept and
    /// the load-more trigger becomes available again.
    pub fn fail_package_page(&mut self, tag: &str, generation: u64) {
        if let Some(state) = self.categories.get_mut(tag) {
            state.fail_fetch(generation);
        }
    }

    /// Rebuild one category subtree after its page state changed.
    fn refresh_category(&mut self, tag: &str, env: &BrowserEnv) {
        let key = crate::browser::node::category_key(tag);
        {
            let ctx = env.context(&self.categories);
            for root in &mut self.roots {
                if let Some(node) = root.find_node(&key, &ctx) {
                    node.build_children(&ctx);
                    node.expanded = true;
                    break;
                }
            }
        }
        self.expansion.on_expanded(&key);
        self.flatten(env);
    }

    /// Rebuild subtrees below stale local directories, keeping expansion.
    pub fn refresh_subtrees(&mut self, dirs: &[PathBuf], env: &BrowserEnv) {
        let saved = self.expansion.snapshot();
        {
            let ctx = env.context(&self.categories);
            for dir in dirs {
                let key = key_for_path(dir);
                for root in &mut self.roots {
                    if root.key == key || crate::browser::node::is_key_ancestor(&root.key, &key) {
                        if let Some(node) = root.find_node(&key, &ctx) {
                            let was_expanded = node.expanded;
                            node.clear_children();
                            if was_expanded {
                                node.ensure_children_built(&ctx);
                                node.expanded = true;
                            }
                        }
                        break;
                    }
                }
            }
            ExpansionStore::restore(&mut self.roots, &saved, &ctx);
        }
        self.flatten(env);
    }

    // ── Search ───────────────────────────────────────────────────────────────

    /// Run (or retype) a search. The pre-search expansion set is snapshotted
    /// once; visible matched folders are forced open during flatten.
    pub fn submit_search(&mut self, query: &str, env: &BrowserEnv, max_depth: usize) {
        let expansion = &self.expansion;
        self.search.submit(query, &self.root_paths, &env.rules, max_depth, || {
            expansion.snapshot()
        });
        self.flatten(env);
    }

    /// Leave search and restore the snapshotted expansion state exactly.
    pub fn clear_search(&mut self, env: &BrowserEnv) {
        if let Some(saved) = self.search.clear() {
            self.expansion.replace(saved);
            self.rebuild(env);
        }
    }

    // ── Grid navigation ──────────────────────────────────────────────────────

    /// Point a grid panel at a local folder.
    pub fn navigate_to(&mut self, path: &Path, env: &BrowserEnv) {
        self.root_paths = vec![path.to_path_buf()];
        self.rebuild(env);
    }

    /// Point a grid panel at an already loaded package set: the records are
    /// copied into this panel's own page state, already exhausted so no
    /// load-more trigger appears.
    pub fn show_packages(
        &mut self,
        tag: &str,
        label: &str,
        records: Vec<PackageRecord>,
        env: &BrowserEnv,
    ) {
        let mut state = CategoryState::default();
        if let Some(token) = state.begin_fetch() {
            let len = records.len();
            state.apply_page(token, records, len + 1);
        }
        self.categories.insert(tag.to_string(), state);
        self.categories_cfg = vec![CategoryConfig {
            tag: tag.to_string(),
            label: label.to_string(),
        }];
        self.root_paths = Vec::new();
        self.kind = PanelKind::Grid;

        self.roots = vec![Node::category(tag, label, 0)];
        {
            let ctx = env.context(&self.categories);
            self.roots[0].ensure_children_built(&ctx);
            self.roots[0].expanded = true;
        }
        self.flatten(env);
    }
}

/// Depth-first flatten of one node into rows, honoring the search session's
/// visibility predicate. While a search is active, visible folders are
/// force-built and opened so that matches deep in unexpanded subtrees
/// surface; the saved expansion flags are left untouched.
fn flatten_node(
    node: &mut Node,
    ctx: &BuildContext,
    search: &SearchSession,
    is_last: bool,
    rows: &mut Vec<Row>,
) {
    if !search.is_visible(node, ctx) {
        return;
    }
    let searching = search.is_active() && !search.query().is_empty();
    let descend = if searching && node.is_dir_like() {
        node.ensure_children_built(ctx);
        true
    } else {
        node.expanded
    };

    rows.push(Row {
        key: node.key.clone(),
        name: node.name.clone(),
        kind: node.kind.clone(),
        depth: node.depth,
        expanded: descend,
        has_children: node.has_children(ctx),
        is_last_sibling: is_last,
    });

    if !descend {
        return;
    }
    let Some(children) = &mut node.children else {
        return;
    };
    let visible: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, c)| search.is_visible(c, ctx))
        .map(|(i, _)| i)
        .collect();
    let last = visible.last().copied();
    for index in visible {
        flatten_node(
            &mut children[index],
            ctx,
            search,
            Some(index) == last,
            rows,
        );
    }
}
