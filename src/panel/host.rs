//! Multi-panel host: the set of open panels, their display arrangement, and
//! cross-panel event fan-out.
//!
//! Panel instance ids are never reused within one project so that each
//! instance keeps its own persisted expansion set.

use serde::{Deserialize, Serialize};

use crate::browser::BrowserEnv;
use crate::panel::controller::{PanelController, PanelEvent, PanelKind};
use crate::persist::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    SideBySide,
    Tabbed,
}

const KEY_IDS: &str = "panels.ids";
const KEY_KINDS: &str = "panels.kinds";
const KEY_MODE: &str = "panels.mode";
const KEY_ACTIVE: &str = "panels.active";
const KEY_NEXT: &str = "panels.next";

pub struct MultiPanelHost {
    pub panels: Vec<PanelController>,
    pub mode: DisplayMode,
    pub active: usize,
    next_instance: usize,
}

impl MultiPanelHost {
    pub fn new(panels: Vec<PanelController>, mode: DisplayMode) -> Self {
        let next_instance = panels.len();
        Self {
            panels,
            mode,
            active: 0,
            next_instance,
        }
    }

    /// Rebuild the host from the persisted layout. `make` constructs one
    /// panel from its saved id and kind. Falls back to `default_layout` when
    /// nothing was saved.
    pub fn restore<F>(store: &StateStore, default_layout: &[PanelKind], mut make: F) -> Self
    where
        F: FnMut(&str, PanelKind) -> PanelController,
    {
        let ids: Vec<String> = store.get(KEY_IDS, Vec::new());
        let kinds: Vec<PanelKind> = store.get(KEY_KINDS, Vec::new());

        let panels: Vec<PanelController> = if ids.len() == kinds.len() && !ids.is_empty() {
            ids.iter()
                .zip(kinds.iter())
                .map(|(id, kind)| make(id, *kind))
                .collect()
        } else {
            default_layout
                .iter()
                .enumerate()
                .map(|(i, kind)| make(&format!("panel{i}"), *kind))
                .collect()
        };

        let mode = store.get(KEY_MODE, DisplayMode::SideBySide);
        let active = store.get(KEY_ACTIVE, 0usize).min(panels.len().saturating_sub(1));
        let next_instance = store.get(KEY_NEXT, panels.len());

        Self {
            panels,
            mode,
            active,
            next_instance,
        }
    }

    /// Write the layout (not the per-panel expansion sets) to the store.
    pub fn persist_layout(&self, store: &mut StateStore) {
        let ids: Vec<&str> = self.panels.iter().map(|p| p.id.as_str()).collect();
        let kinds: Vec<PanelKind> = self.panels.iter().map(|p| p.kind).collect();
        store.set(KEY_IDS, &ids);
        store.set(KEY_KINDS, &kinds);
        store.set(KEY_MODE, &self.mode);
        store.set(KEY_ACTIVE, &self.active);
        store.set(KEY_NEXT, &self.next_instance);
    }

    pub fn active_panel(&mut self) -> &mut PanelController {
        &mut self.panels[self.active]
    }

    pub fn active_panel_ref(&self) -> &PanelController {
        &self.panels[self.active]
    }

    /// Claim a fresh panel id.
    pub fn next_panel_id(&mut self) -> String {
        let id = format!("panel{}", self.next_instance);
        self.next_instance += 1;
        id
    }

    /// Add a panel and focus it.
    pub fn insert(&mut self, panel: PanelController) {
        self.panels.push(panel);
        self.active = self.panels.len() - 1;
    }

    /// Close the focused panel. The last remaining panel cannot be closed;
    /// dropping to a single panel leaves tabbed mode.
    pub fn remove_active(&mut self) -> Option<PanelController> {
        if self.panels.len() <= 1 {
            return None;
        }
        let removed = self.panels.remove(self.active);
        if self.active >= self.panels.len() {
            self.active = self.panels.len() - 1;
        }
        if self.panels.len() == 1 {
            self.mode = DisplayMode::SideBySide;
        }
        Some(removed)
    }

    pub fn focus_next(&mut self) {
        self.active = (self.active + 1) % self.panels.len();
    }

    pub fn focus_prev(&mut self) {
        self.active = (self.active + self.panels.len() - 1) % self.panels.len();
    }

    /// Swap the focused panel with its left neighbor, keeping focus on it.
    pub fn swap_left(&mut self) {
        if self.active == 0 {
            return;
        }
        self.panels.swap(self.active - 1, self.active);
        self.active -= 1;
    }

    /// Swap the focused panel with its right neighbor, keeping focus on it.
    pub fn swap_right(&mut self) {
        if self.active + 1 >= self.panels.len() {
            return;
        }
        self.panels.swap(self.active, self.active + 1);
        self.active += 1;
    }

    pub fn toggle_mode(&mut self) {
        if self.panels.len() <= 1 {
            return;
        }
        self.mode = match self.mode {
            DisplayMode::SideBySide => DisplayMode::Tabbed,
            DisplayMode::Tabbed => DisplayMode::SideBySide,
        };
    }

    /// Fan panel events out to the other panels: folder selections steer
    /// grid panels, loaded package sets populate them.
    pub fn broadcast(&mut self, origin: usize, events: &[PanelEvent], env: &BrowserEnv) {
        for event in events {
            match event {
                PanelEvent::FolderSelected(path) => {
                    for (i, panel) in self.panels.iter_mut().enumerate() {
                        if i != origin && panel.kind == PanelKind::Grid {
                            panel.navigate_to(path, env);
                        }
                    }
                }
                PanelEvent::PackagesLoaded(tag) => {
                    let records = self.panels[origin]
                        .categories
                        .get(tag)
                        .map(|state| state.loaded.clone())
                        .unwrap_or_default();
                    let label = self.panels[origin]
                        .category_label(tag)
                        .unwrap_or(tag)
                        .to_string();
                    for (i, panel) in self.panels.iter_mut().enumerate() {
                        if i != origin && panel.kind == PanelKind::Grid {
                            panel.show_packages(tag, &label, records.clone(), env);
                        }
                    }
                }
                // File opens are handled by the app, not by sibling panels.
                PanelEvent::FileSelected(_) => {}
            }
        }
    }
}
