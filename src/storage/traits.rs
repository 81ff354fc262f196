//! Storage traits and error types
//!
//! This module defines the trait interface for page collection backends and
//! associated error types.

use crate::storage::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid cache TTL: {0}")]
    InvalidTtl(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page collection backends
///
/// The traversal engine checkpoints through this trait and incremental runs
/// reload from it.
pub trait PageStore {
    /// Loads a previously persisted page collection
    ///
    /// Returns an empty collection when nothing has been persisted yet.
    fn load_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Persists the full page collection, replacing any previous one
    fn save_pages(&self, pages: &[PageRecord]) -> StorageResult<()>;

    /// Human-readable location of the backing store, for logging
    fn describe(&self) -> String;
}
