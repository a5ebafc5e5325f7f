//! Cache entry reads and writes.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::PathBuf;

use super::db::{unix_timestamp, CacheDb};
use crate::storage::CacheEntry;

/// A stored entry plus the time it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub entry: CacheEntry,
    /// Unix seconds.
    pub updated_at: i64,
}

fn record_from_row(row: &SqliteRow) -> CacheRecord {
    let file_path: String = row.get("file_path");
    CacheRecord {
        entry: CacheEntry {
            logical_name: row.get("logical_name"),
            file_path: PathBuf::from(file_path),
            source_url: row.get("source_url"),
            hash: row.get("hash"),
        },
        updated_at: row.get("updated_at"),
    }
}

impl CacheDb {
    /// Fetch the entry for `logical_name`, if any.
    pub async fn get_entry(&self, logical_name: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(
            r#"
            SELECT logical_name, file_path, source_url, hash, updated_at
            FROM cache_entries
            WHERE logical_name = ?1
            "#,
        )
        .bind(logical_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| record_from_row(&row).entry))
    }

    /// Insert or replace the row for `entry.logical_name` in one statement.
    pub async fn upsert_entry(&self, entry: &CacheEntry) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO cache_entries (logical_name, file_path, source_url, hash, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(logical_name) DO UPDATE SET
                file_path = excluded.file_path,
                source_url = excluded.source_url,
                hash = excluded.hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.logical_name)
        .bind(entry.file_path.to_string_lossy().into_owned())
        .bind(&entry.source_url)
        .bind(&entry.hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All rows ordered by logical name.
    pub async fn list_entries(&self) -> Result<Vec<CacheRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT logical_name, file_path, source_url, hash, updated_at
            FROM cache_entries
            ORDER BY logical_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Delete the row for `logical_name`. Returns false if there was none.
    ///
    /// The cached file itself is left alone; callers decide whether to delete it.
    pub async fn remove_entry(&self, logical_name: &str) -> Result<bool> {
        let r = sqlx::query(
            r#"
            DELETE FROM cache_entries
            WHERE logical_name = ?1
            "#,
        )
        .bind(logical_name)
        .execute(&self.pool)
        .await?;

        Ok(r.rows_affected() > 0)
    }
}
