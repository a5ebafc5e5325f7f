//! Synchronous [`Storage`] over [`CacheDb`].

use anyhow::{Context, Result};
use std::path::Path;
use tokio::runtime::Runtime;

use super::db::CacheDb;
use super::entries::CacheRecord;
use crate::storage::{CacheEntry, Storage};

/// Durable [`Storage`] backed by a SQLite file.
///
/// Owns a small tokio runtime and blocks on it for every call, so it must
/// not be used from inside another tokio runtime.
pub struct SqliteStorage {
    db: CacheDb,
    runtime: Runtime,
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("datamgr-sqlite")
        .enable_all()
        .build()
        .context("failed to start storage runtime")
}

impl SqliteStorage {
    /// Open the index at the default XDG state path.
    pub fn open_default() -> Result<Self> {
        let runtime = build_runtime()?;
        let db = runtime.block_on(CacheDb::open_default())?;
        Ok(Self { db, runtime })
    }

    /// Open (or create) the index at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let runtime = build_runtime()?;
        let db = runtime.block_on(CacheDb::open_at(path))?;
        Ok(Self { db, runtime })
    }

    /// Entries with their write timestamps.
    pub fn records(&self) -> Result<Vec<CacheRecord>> {
        self.runtime.block_on(self.db.list_entries())
    }

    /// Drop the entry for `logical_name`. Returns false if there was none.
    pub fn remove(&self, logical_name: &str) -> Result<bool> {
        self.runtime.block_on(self.db.remove_entry(logical_name))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, logical_name: &str) -> Result<Option<CacheEntry>> {
        self.runtime.block_on(self.db.get_entry(logical_name))
    }

    fn put(&self, entry: CacheEntry) -> Result<()> {
        self.runtime.block_on(self.db.upsert_entry(&entry))
    }

    fn all(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.records()?.into_iter().map(|r| r.entry).collect())
    }
}
