//! Filesystem watcher for local roots.
//!
//! Change notifications arrive on the watcher's own thread; they are
//! debounced, filtered against the same name patterns the tree excludes, and
//! marshaled onto the event channel as [`Event::SubtreeStale`]. All tree
//! mutation happens on the main loop when that event is drained.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;

/// Path components dropped before reporting, matching the browser's
/// exclusion defaults plus version-control noise.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".git", "cache", "target"];

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Above this many changed paths per debounce window, the batch collapses to
/// a single root-level refresh.
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Watches one local root recursively and posts stale-subtree events.
pub struct RootWatcher {
    active: Arc<AtomicBool>,
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl RootWatcher {
    pub fn new(
        root: &Path,
        debounce: Duration,
        ignore_patterns: Vec<String>,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let active_flag = active.clone();
        let root_path = root.to_path_buf();

        let mut debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_flag.load(Ordering::Relaxed) {
                    return;
                }
                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p, &ignore_patterns))
                            .collect();
                        if paths.is_empty() {
                            return;
                        }
                        let batch = if paths.len() > flood_threshold {
                            vec![root_path.clone()]
                        } else {
                            paths
                        };
                        let _ = event_tx.send(Event::SubtreeStale(batch));
                    }
                    // Watcher errors never take the browser down.
                    Err(_) => {}
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;

        Ok(Self {
            active,
            _debouncer: debouncer,
        })
    }

    /// Stop forwarding without tearing down the inotify watches (bulk
    /// operations re-enable afterwards).
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// A path is ignored when any component equals an ignore pattern.
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    path.components().any(|component| {
        matches!(
            component,
            std::path::Component::Normal(name)
                if patterns.iter().any(|p| name.to_string_lossy() == *p)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ignores_version_control_and_artifact_dirs() {
        let patterns = patterns(&[".git", "cache", "target"]);
        assert!(should_ignore(Path::new("/proj/.git/HEAD"), &patterns));
        assert!(should_ignore(Path::new("/proj/cache/thumb.png"), &patterns));
        assert!(should_ignore(Path::new("/proj/target/out.bin"), &patterns));
        assert!(!should_ignore(Path::new("/proj/assets/tree.mdl"), &patterns));
    }

    #[test]
    fn component_match_is_exact() {
        let patterns = patterns(&["cache"]);
        assert!(!should_ignore(Path::new("/proj/cache2/file"), &patterns));
        assert!(!should_ignore(Path::new("/proj/my_cache/file"), &patterns));
    }

    #[test]
    fn empty_patterns_ignore_nothing() {
        assert!(!should_ignore(Path::new("/proj/.git/HEAD"), &[]));
    }

    #[test]
    fn flood_collapses_to_root() {
        let root = PathBuf::from("/proj");
        let paths: Vec<PathBuf> = (0..150)
            .map(|i| PathBuf::from(format!("/proj/f{i}")))
            .collect();

        let batch = if paths.len() > DEFAULT_FLOOD_THRESHOLD {
            vec![root.clone()]
        } else {
            paths
        };
        assert_eq!(batch, vec![root]);
    }
}
