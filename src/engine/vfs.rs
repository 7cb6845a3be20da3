// Shared staging filesystem: an in-memory byte store keyed by path strings,
// visible identically to the coordinator, the worker, and the engine.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use parking_lot::RwLock;

pub struct StagingFs {
    files: RwLock<HashMap<String, Bytes>>,
}

impl StagingFs {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Create or replace the file at `path`.
    pub fn write_file(&self, path: &str, data: Bytes) {
        self.files.write().insert(path.to_owned(), data);
    }

    /// Read the file at `path`.
    pub fn read_file(&self, path: &str) -> Result<Bytes> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no staged file at {}", path))
    }

    /// Remove the file at `path`.
    pub fn unlink(&self, path: &str) -> Result<()> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no staged file at {}", path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    /// Number of staged files currently held.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Default for StagingFs {
    fn default() -> Self {
        Self::new()
    }
}
