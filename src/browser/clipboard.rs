use std::path::PathBuf;

use crate::browser::ops::{DropAction, DropEntry};

/// The type of clipboard operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Copy,
    Cut,
}

/// Internal clipboard buffer holding asset paths and operation type. Paste
/// turns the buffer into drop entries against the target folder.
#[derive(Debug, Clone, Default)]
pub struct ClipboardState {
    pub paths: Vec<PathBuf>,
    pub operation: Option<ClipboardOp>,
}

impl ClipboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clipboard with paths and operation type.
    pub fn set(&mut self, paths: Vec<PathBuf>, op: ClipboardOp) {
        self.paths = paths;
        self.operation = Some(op);
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.operation = None;
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Convert the buffer into drop entries. A cut pastes as a move, a copy
    /// as a copy.
    pub fn as_drop_entries(&self) -> Vec<DropEntry> {
        let Some(op) = self.operation else {
            return Vec::new();
        };
        let action = match op {
            ClipboardOp::Copy => DropAction::Copy,
            ClipboardOp::Cut => DropAction::Move,
        };
        self.paths
            .iter()
            .map(|path| DropEntry {
                path: path.clone(),
                action,
            })
            .collect()
    }
}
