//! Asset browser core: lazy trees, filtering, expansion persistence,
//! remote packages, and filesystem operations.

pub mod clipboard;
pub mod expansion;
pub mod filter;
pub mod node;
pub mod ops;
pub mod remote;
pub mod search;
pub mod watcher;

use node::{BuildContext, ExclusionRules};
use remote::{CategoryPages, ManifestCache};

/// Shared read-only collaborators for tree building, owned by the app and
/// borrowed into a [`BuildContext`] together with a panel's category pages.
pub struct BrowserEnv {
    pub rules: ExclusionRules,
    pub manifests: ManifestCache,
    pub scan_depth: usize,
}

impl BrowserEnv {
    pub fn context<'a>(&'a self, categories: &'a CategoryPages) -> BuildContext<'a> {
        BuildContext {
            rules: &self.rules,
            manifests: &self.manifests,
            categories,
            scan_depth: self.scan_depth,
        }
    }
}
