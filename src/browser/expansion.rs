//! Expansion state: the set of identity keys currently "open" in one panel.
//!
//! Node objects are discarded wholesale on every rebuild, so which nodes are
//! open is externalized here and replayed against the fresh tree. The
//! persisted form outlives the process; writes are debounced by comparing
//! against the last-persisted snapshot on the tick instead of writing on
//! every mutation.

use std::collections::HashSet;

use crate::browser::node::{is_key_ancestor, BuildContext, Node};
use crate::persist::StateStore;

pub struct ExpansionStore {
    store_key: String,
    open: HashSet<String>,
    last_persisted: HashSet<String>,
}

impl ExpansionStore {
    /// Restore the persisted set for one panel instance.
    pub fn load(panel_id: &str, store: &StateStore) -> Self {
        let store_key = format!("expansion.{panel_id}");
        let saved: Vec<String> = store.get(&store_key, Vec::new());
        let open: HashSet<String> = saved.into_iter().collect();
        Self {
            store_key,
            last_persisted: open.clone(),
            open,
        }
    }

    pub fn on_expanded(&mut self, key: &str) {
        self.open.insert(key.to_string());
    }

    pub fn on_collapsed(&mut self, key: &str) {
        self.open.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.open.contains(key)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.open.clone()
    }

    /// Overwrite the open set (used when leaving a search session).
    pub fn replace(&mut self, keys: HashSet<String>) {
        self.open = keys;
    }

    /// Replay a saved key set against a freshly rebuilt forest.
    ///
    /// A node is re-expanded when its identity is in `saved`, or when some
    /// saved key has the node's identity as a strict prefix — it is then an
    /// ancestor of a saved leaf and must be opened for the leaf to become
    /// reachable, without itself entering the saved set. Keys that no longer
    /// resolve are silently skipped.
    pub fn restore(roots: &mut [Node], saved: &HashSet<String>, ctx: &BuildContext) {
        for node in roots {
            Self::restore_node(node, saved, ctx);
        }
    }

    fn restore_node(node: &mut Node, saved: &HashSet<String>, ctx: &BuildContext) {
        let in_saved = saved.contains(&node.key);
        let is_ancestor =
            in_saved || saved.iter().any(|key| is_key_ancestor(&node.key, key));
        if !is_ancestor {
            return;
        }
        node.ensure_children_built(ctx);
        node.expanded = true;
        if let Some(children) = &mut node.children {
            for child in children {
                Self::restore_node(child, saved, ctx);
            }
        }
    }

    /// Debounced persistence: write only when the set changed since the last
    /// flush. Called from the periodic tick.
    pub fn maybe_flush(&mut self, store: &mut StateStore) {
        if self.open != self.last_persisted {
            self.flush(store);
        }
    }

    /// Unconditional write-through (panel teardown).
    pub fn flush(&mut self, store: &mut StateStore) {
        let mut keys: Vec<&String> = self.open.iter().collect();
        keys.sort();
        store.set(&self.store_key, &keys);
        self.last_persisted = self.open.clone();
    }
}
