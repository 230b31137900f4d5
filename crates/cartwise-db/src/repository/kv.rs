//! # Key-Value Repository
//!
//! `KeyValueStore` over the `kv_store` table.
//!
//! ## Table
//! ```text
//! ┌───────────────┬──────────────────────────────┬──────────────────────────┐
//! │ key (PK)      │ value                        │ updated_at               │
//! ├───────────────┼──────────────────────────────┼──────────────────────────┤
//! │ favorites     │ [{"product_id":"42",...}]    │ 2026-01-01T10:00:00Z     │
//! └───────────────┴──────────────────────────────┴──────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::kv::KeyValueStore;

/// Repository for key-value rows.
///
/// ## Usage
/// ```rust,ignore
/// let repo = KvRepository::new(pool);
/// repo.set("favorites", "[]").await?;
/// ```
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    /// Creates a new KvRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Lists every stored key, sorted. For diagnostics.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for KvRepository {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        debug!(key = %key, found = value.is_some(), "kv get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, bytes = value.len(), "kv set");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key = %key, removed = result.rows_affected(), "kv delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("kv.db")))
            .await
            .unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_dir, db) = repo().await;
        let kv = db.kv();

        assert_eq!(kv.get("favorites").await.unwrap(), None);
        kv.set("favorites", r#"[{"product_id":"1"}]"#).await.unwrap();
        assert_eq!(
            kv.get("favorites").await.unwrap().as_deref(),
            Some(r#"[{"product_id":"1"}]"#)
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_dir, db) = repo().await;
        let kv = db.kv();

        kv.set("favorites", "[1]").await.unwrap();
        kv.set("favorites", "[2]").await.unwrap();
        assert_eq!(kv.get("favorites").await.unwrap().as_deref(), Some("[2]"));
        assert_eq!(kv.keys().await.unwrap(), vec!["favorites".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, db) = repo().await;
        let kv = db.kv();

        kv.set("favorites", "[]").await.unwrap();
        kv.delete("favorites").await.unwrap();
        kv.delete("favorites").await.unwrap();
        assert_eq!(kv.get("favorites").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.kv().set("favorites", "[42]").await.unwrap();
        db.close().await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.kv().get("favorites").await.unwrap().as_deref(), Some("[42]"));
    }
}
