// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Raw Storage
//!
//! A [`RawStorage`] backend over `sqlx`'s SQLite driver. Enables WAL mode for
//! concurrent readers, uses prepared statements throughout, and wraps writes
//! in an explicit transaction so a crash mid-write never leaves a record with
//! a value and no metadata (or vice versa).
//!
//! Schema is applied as `CREATE TABLE IF NOT EXISTS` at [`SqlStorage::connect`]
//! time rather than through file-based migrations: this crate's own schema is
//! fixed (one table), so a migration runner would only add ceremony.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use strongbox_domain::adapter::RawStorage;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::metadata::RecordMetadata;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    metadata TEXT NOT NULL
)
"#;

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_kv_store_key_prefix ON kv_store(key)";

fn map_sqlx_err(err: sqlx::Error) -> StorageError {
    StorageError::Database(err.to_string())
}

/// Snapshot returned by [`SqlStorage::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlStorageStats {
    pub total_items: u64,
    pub total_size: u64,
    pub largest_item: u64,
    pub oldest_item: Option<i64>,
    pub namespaces: Vec<String>,
    pub indexes: Vec<String>,
}

pub struct SqlStorage {
    pool: SqlitePool,
}

impl SqlStorage {
    /// Opens (creating if necessary) a SQLite database at `path`, enables
    /// WAL journaling and foreign keys, and ensures the `kv_store` table
    /// exists.
    pub async fn connect(path: &str) -> Result<Self, StorageError> {
        debug!(path, "opening sqlite storage");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .map_err(map_sqlx_err)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(30_000))
            .pragma("cache_size", "10000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "268435456");

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(map_sqlx_err)?;

        sqlx::query(CREATE_TABLE).execute(&pool).await.map_err(map_sqlx_err)?;
        sqlx::query(CREATE_INDEX).execute(&pool).await.map_err(map_sqlx_err)?;

        info!(path, "sqlite storage ready");
        Ok(Self { pool })
    }

    /// Runs `VACUUM` and `ANALYZE` to reclaim free pages and refresh the
    /// query planner's statistics. Intended for periodic maintenance, not
    /// the hot path.
    pub async fn maintain(&self) -> Result<(), StorageError> {
        sqlx::query("VACUUM").execute(&self.pool).await.map_err(map_sqlx_err)?;
        sqlx::query("ANALYZE").execute(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(())
    }

    /// Aggregate snapshot of the table: size totals straight from `LENGTH()`,
    /// `created_at` pulled out of the JSON `metadata` column since there's no
    /// dedicated column for it, and distinct namespaces derived from the part
    /// of each key before its first `:`.
    pub async fn stats(&self) -> Result<SqlStorageStats, StorageError> {
        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let total_size: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(LENGTH(key) + LENGTH(value) + LENGTH(metadata)) FROM kv_store",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let largest_item: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(LENGTH(key) + LENGTH(value) + LENGTH(metadata)) FROM kv_store",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let oldest_item: Option<i64> =
            sqlx::query_scalar("SELECT MIN(json_extract(metadata, '$.created_at')) FROM kv_store")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        let namespaces: Vec<String> = keys
            .iter()
            .filter_map(|k| k.split_once(':').map(|(ns, _)| ns.to_string()))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(SqlStorageStats {
            total_items: total_items as u64,
            total_size: total_size.unwrap_or(0) as u64,
            largest_item: largest_item.unwrap_or(0) as u64,
            oldest_item,
            namespaces,
            indexes: vec!["idx_kv_store_key_prefix".to_string()],
        })
    }
}

#[async_trait]
impl RawStorage for SqlStorage {
    async fn get_raw(&self, key: &StorageKey) -> Result<Option<(Value, RecordMetadata)>, StorageError> {
        let row = sqlx::query("SELECT value, metadata FROM kv_store WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value_text: String = row.try_get("value").map_err(map_sqlx_err)?;
        let metadata_text: String = row.try_get("metadata").map_err(map_sqlx_err)?;
        let value: Value = serde_json::from_str(&value_text)?;
        let metadata: RecordMetadata = serde_json::from_str(&metadata_text)?;
        Ok(Some((value, metadata)))
    }

    async fn set_raw(&self, key: &StorageKey, value: Value, metadata: RecordMetadata) -> Result<(), StorageError> {
        let value_text = serde_json::to_string(&value)?;
        let metadata_text = serde_json::to_string(&metadata)?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        sqlx::query(
            "INSERT INTO kv_store (key, value, metadata) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, metadata = excluded.metadata",
        )
        .bind(key.as_str())
        .bind(value_text)
        .bind(metadata_text)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn delete_raw(&self, key: &StorageKey) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_raw(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store").execute(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn list_raw(&self, prefix: Option<&str>) -> Result<Vec<StorageKey>, StorageError> {
        let rows = match prefix {
            Some(p) => {
                sqlx::query("SELECT key FROM kv_store WHERE key LIKE ?1 ORDER BY key")
                    .bind(format!("{p}%"))
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query("SELECT key FROM kv_store ORDER BY key").fetch_all(&self.pool).await,
        }
        .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                let k: String = row.try_get("key").map_err(map_sqlx_err)?;
                StorageKey::new(k)
            })
            .collect()
    }

    async fn count_raw(&self, prefix: Option<&str>) -> Result<u64, StorageError> {
        let count: i64 = match prefix {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM kv_store WHERE key LIKE ?1")
                    .bind(format!("{p}%"))
                    .fetch_one(&self.pool)
                    .await
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM kv_store").fetch_one(&self.pool).await,
        }
        .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }

    async fn has_raw(&self, key: &StorageKey) -> Result<bool, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store WHERE key = ?1")
            .bind(key.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count > 0)
    }

    async fn size_bytes_raw(&self) -> Result<u64, StorageError> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(LENGTH(key) + LENGTH(value) + LENGTH(metadata)) FROM kv_store",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(total.unwrap_or(0) as u64)
    }

    async fn initialize(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
