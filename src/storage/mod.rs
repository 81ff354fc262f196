//! Storage module for persisting harvest data
//!
//! This module handles:
//! - The `PageRecord` type, the unit of harvested content
//! - JSON persistence of the page collection (checkpoints and incremental resume)
//! - The SQLite-backed HTTP response cache
//! - Atomic file writes shared by every artifact writer

mod cache;
mod json;
mod schema;
mod traits;

pub use cache::{CachedResponse, ResponseCache};
pub use json::JsonPageStore;
pub use traits::{PageStore, StorageError, StorageResult};

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// One harvested document
///
/// `url` is the unique key of a record within a harvest session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Source URL of the page
    pub url: String,

    /// Best-effort display title
    pub title: String,

    /// Extracted HTML fragment with navigation chrome removed
    pub content: String,

    /// Plain-text projection of `content`
    pub text: String,
}

/// Writes a file atomically
///
/// The contents go to a temporary file in the destination directory which is
/// then renamed over `path`, so readers only ever see the old file or the
/// complete new one.
///
/// # Arguments
///
/// * `path` - Destination path; its parent directory must exist
/// * `contents` - Bytes to write
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
