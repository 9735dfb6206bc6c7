//! JSON key-value state store, scoped to one project.
//!
//! Backs the persistence capability: per-panel expansion sets and the panel
//! layout survive editor restarts. Values are plain JSON under string keys;
//! callers serialize through serde. Writes are buffered in memory and
//! flushed by the debounce tick and on teardown.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

pub struct StateStore {
    /// `None` for an in-memory store (tests, or no state directory).
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
    dirty: bool,
}

impl StateStore {
    /// Load the store from `path`. A missing or unparsable file starts
    /// empty; the parse failure is logged, not fatal.
    pub fn load(path: &Path) -> Self {
        let values = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), %err, "state file unparsable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path.to_path_buf()),
            values,
            dirty: false,
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Read a value, falling back to `default` when the key is absent or the
    /// stored value does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                if self.values.get(key) != Some(&json) {
                    self.values.insert(key.to_string(), json);
                    self.dirty = true;
                }
            }
            Err(err) => warn!(key, %err, "value not serializable, skipping"),
        }
    }

    /// Write the store to disk if anything changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&self.values)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            fs::write(path, content)?;
        }
        self.dirty = false;
        Ok(())
    }
}
