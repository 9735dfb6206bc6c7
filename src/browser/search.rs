//! Search session: snapshot expansion, compute the match set, prune the
//! view, and put everything back on clear.
//!
//! The session is a two-state machine. Entering search snapshots the
//! panel's expansion set exactly once; retyping recomputes the match set in
//! place without touching the snapshot; clearing hands the snapshot back for
//! replay against the rebuilt tree.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::browser::filter;
use crate::browser::node::{BuildContext, ExclusionRules, Node, NodeKind};

#[derive(Default)]
pub struct SearchSession {
    query: String,
    query_lower: String,
    match_set: HashSet<String>,
    /// `Some` exactly while the session is active.
    saved_expansion: Option<HashSet<String>>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.saved_expansion.is_some()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn match_count(&self) -> usize {
        self.match_set.len()
    }

    /// Enter search or update the query of an active search. The expansion
    /// snapshot is taken only on the Idle→Active edge.
    pub fn submit(
        &mut self,
        query: &str,
        roots: &[PathBuf],
        rules: &ExclusionRules,
        max_depth: usize,
        snapshot: impl FnOnce() -> HashSet<String>,
    ) {
        if self.saved_expansion.is_none() {
            self.saved_expansion = Some(snapshot());
        }
        self.query = query.to_string();
        self.query_lower = query.to_lowercase();
        self.match_set = filter::compute_matches(roots, query, rules, max_depth);
    }

    /// Leave search. Returns the snapshotted expansion set for replay, or
    /// `None` when the session was already idle.
    pub fn clear(&mut self) -> Option<HashSet<String>> {
        self.query.clear();
        self.query_lower.clear();
        self.match_set.clear();
        self.saved_expansion.take()
    }

    /// Visibility predicate installed while active. An empty query hides
    /// nothing. Section-header kinds (categories, load-more sentinels) are
    /// always visible; local nodes use the precomputed match set; package
    /// nodes have no local path and match on their own name or anything in
    /// the manifest below them.
    pub fn is_visible(&self, node: &Node, ctx: &BuildContext) -> bool {
        if !self.is_active() || self.query_lower.is_empty() {
            return true;
        }
        match &node.kind {
            NodeKind::Category { .. } | NodeKind::LoadMore { .. } => true,
            NodeKind::LocalFolder | NodeKind::LocalFile => self.match_set.contains(&node.key),
            NodeKind::PackageFolder { .. }
            | NodeKind::PackageSubFolder { .. }
            | NodeKind::PackageFile { .. } => node.matches_filter(&self.query_lower, ctx),
        }
    }
}
