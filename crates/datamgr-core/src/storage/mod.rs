//! Cache index: logical name → cached file metadata.
//!
//! Two interchangeable backends implement [`Storage`]: [`InMemStorage`] for
//! process-lifetime caches and tests, and [`SqliteStorage`] for a durable
//! index shared across runs. The data manager only sees the trait.

mod memory;
mod sqlite;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use memory::InMemStorage;
pub use sqlite::{default_db_path, CacheDb, CacheRecord, SqliteStorage};

/// One verified, cached data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub logical_name: String,
    /// Absolute local path of the downloaded content.
    pub file_path: PathBuf,
    /// URL the content was fetched from.
    pub source_url: String,
    /// Lowercase hex SHA-256 of the content at write time.
    pub hash: String,
}

/// Mapping from logical name to [`CacheEntry`].
///
/// Implementations must make `put` atomic with respect to concurrent `get`
/// and `all`: a reader sees either the old entry or the new one.
pub trait Storage: Send + Sync {
    /// Entry for `logical_name`, or `None` if nothing is cached under it.
    fn get(&self, logical_name: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry for `entry.logical_name`.
    fn put(&self, entry: CacheEntry) -> Result<()>;

    /// Every entry, ordered by logical name.
    fn all(&self) -> Result<Vec<CacheEntry>>;
}

#[cfg(test)]
pub(crate) fn sample_entry(name: &str) -> CacheEntry {
    CacheEntry {
        logical_name: name.to_string(),
        file_path: PathBuf::from(format!("/var/cache/datamgr/{name}.fits")),
        source_url: format!("https://data.example.org/{name}.fits"),
        hash: "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03".to_string(),
    }
}
