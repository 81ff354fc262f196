//! SQLite-backed HTTP response cache
//!
//! Successful GET responses are cached by URL so repeated runs within the
//! TTL do not hit the network. Only 2xx responses are ever stored.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// A response served from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// URL after redirects when the response was fetched
    pub final_url: String,
    pub status_code: u16,
    pub body: String,
}

/// Response cache with a fixed time-to-live
pub struct ResponseCache {
    conn: Mutex<Connection>,
    ttl_secs: i64,
}

impl ResponseCache {
    /// Opens (or creates) a cache database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `ttl` - How long an entry stays fresh; must be non-zero
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseCache)` - Successfully opened the cache
    /// * `Err(StorageError)` - Failed to open the database or invalid TTL
    pub fn open(path: &Path, ttl: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Self::with_connection(conn, ttl)
    }

    /// Creates an in-memory cache (for testing)
    pub fn in_memory(ttl: Duration) -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> StorageResult<Self> {
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| StorageError::InvalidTtl(format!("{:?} is too large", ttl)))?;
        if ttl_secs == 0 {
            return Err(StorageError::InvalidTtl("TTL must be at least one second".to_string()));
        }

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            ttl_secs,
        })
    }

    /// Looks up a fresh entry for a URL
    ///
    /// Entries older than the TTL are treated as missing.
    pub fn get(&self, url: &str) -> StorageResult<Option<CachedResponse>> {
        let cutoff = Utc::now().timestamp() - self.ttl_secs;
        let conn = self.lock();

        let cached = conn
            .query_row(
                "SELECT final_url, status_code, body FROM responses
                 WHERE url_hash = ?1 AND fetched_at > ?2",
                params![url_key(url), cutoff],
                |row| {
                    Ok(CachedResponse {
                        final_url: row.get(0)?,
                        status_code: row.get(1)?,
                        body: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(cached)
    }

    /// Stores a successful response, replacing any previous entry
    pub fn put(&self, url: &str, response: &CachedResponse) -> StorageResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO responses (url_hash, url, final_url, status_code, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                url_key(url),
                url,
                response.final_url,
                response.status_code,
                response.body,
                Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    /// Deletes expired entries
    ///
    /// # Returns
    ///
    /// The number of entries removed
    pub fn purge_expired(&self) -> StorageResult<usize> {
        let cutoff = Utc::now().timestamp() - self.ttl_secs;
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM responses WHERE fetched_at <= ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // SQLite stays consistent across a panicked holder
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn backdate(&self, url: &str, secs: i64) {
        let conn = self.lock();
        conn.execute(
            "UPDATE responses SET fetched_at = fetched_at - ?1 WHERE url_hash = ?2",
            params![secs, url_key(url)],
        )
        .unwrap();
    }
}

/// Cache key for a URL
fn url_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}
