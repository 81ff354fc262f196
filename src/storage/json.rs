//! JSON page collection store
//!
//! The JSON file is both the final artifact and the resume source of an
//! incremental run.

use crate::storage::traits::{PageStore, StorageResult};
use crate::storage::{write_atomic, PageRecord};
use std::path::{Path, PathBuf};

/// Stores the page collection as a pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonPageStore {
    path: PathBuf,
}

impl JsonPageStore {
    /// Creates a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing JSON file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageStore for JsonPageStore {
    fn load_pages(&self) -> StorageResult<Vec<PageRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let pages: Vec<PageRecord> = serde_json::from_str(&content)?;
        Ok(pages)
    }

    fn save_pages(&self, pages: &[PageRecord]) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(pages)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
