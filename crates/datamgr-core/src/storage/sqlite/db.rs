//! Connection and schema for the SQLite cache index.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// `~/.local/state/datamgr/cache.db` on Debian.
pub fn default_db_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("datamgr")?;
    Ok(xdg_dirs.get_state_home().join("datamgr").join("cache.db"))
}

/// Handle to the SQLite-backed cache index.
#[derive(Clone)]
pub struct CacheDb {
    pub(super) pool: Pool<Sqlite>,
}

impl CacheDb {
    /// Open (or create) the index at [`default_db_path`].
    pub async fn open_default() -> Result<Self> {
        Self::open_at(default_db_path()?).await
    }

    /// Open (or create) the index at `path`, creating parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("open cache index {}", path.display()))?;
        let db = CacheDb { pool };
        db.migrate().await?;
        tracing::debug!(path = %path.display(), "cache index opened");
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // One row per logical name; `put` is an upsert on the primary key,
        // so a row is always replaced as a whole.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                logical_name TEXT PRIMARY KEY NOT NULL,
                file_path TEXT NOT NULL,
                source_url TEXT NOT NULL,
                hash TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Current time as Unix seconds (for row timestamps).
pub(super) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
/// Open an in-memory index for tests (no disk I/O).
pub(super) async fn open_memory() -> Result<CacheDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = CacheDb { pool };
    db.migrate().await?;
    Ok(db)
}
