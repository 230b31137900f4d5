//! # Key-Value Store Contract
//!
//! The on-device store the favorites list is persisted to: string keys,
//! string values.
//!
//! ```text
//! get(key)        -> Option<String>     (None when the key was never set)
//! set(key, value) -> ()                 (insert or overwrite)
//! delete(key)     -> ()                 (deleting a missing key succeeds)
//! ```
//!
//! Implementations:
//! - [`KvRepository`](crate::repository::kv::KvRepository) - SQLite, used by the app
//! - [`MemoryStore`] - process memory, for tests and UI previews

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DbResult;

/// String key-value persistence.
///
/// Implementations are shared across tasks (`Arc<dyn KeyValueStore>`), so
/// they must be `Send + Sync`.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> DbResult<()>;
}

// =============================================================================
// Memory Store
// =============================================================================

/// Non-durable [`KeyValueStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MemoryStore {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_store_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("favorites").await.unwrap(), None);

        store.set("favorites", "[]").await.unwrap();
        assert_eq!(store.get("favorites").await.unwrap().as_deref(), Some("[]"));

        store.set("favorites", "[1]").await.unwrap();
        assert_eq!(store.get("favorites").await.unwrap().as_deref(), Some("[1]"));

        store.delete("favorites").await.unwrap();
        assert_eq!(store.get("favorites").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nothing-here").await.is_ok());
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::with_entries([("a", "1")]));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
