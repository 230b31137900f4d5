//! # App Session
//!
//! Wires the stores for one run of the app and tears them down at exit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Session Startup                                 │
//! │                                                                         │
//! │  AppConfig::load_or_default(None)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppSession::start(config)                                              │
//! │       │                                                                 │
//! │       ├──► Database::new(DbConfig) ← open SQLite, run migrations        │
//! │       │                                                                 │
//! │       ├──► CartStore::new()                                             │
//! │       │                                                                 │
//! │       └──► FavoritesStore::new(db.kv(), favorites_key)                  │
//! │                 (load runs in the background)                           │
//! │                                                                         │
//! │  Screens receive session.cart() / session.favorites() clones            │
//! │                                                                         │
//! │  AppSession::shutdown() ──► flush favorites ──► close pool              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use cartwise_db::{Database, DbConfig, KeyValueStore};
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::cart::CartStore;
use crate::config::AppConfig;
use crate::error::StateResult;
use crate::favorites::FavoritesStore;

/// Everything the screens of one app run share.
#[derive(Debug)]
pub struct AppSession {
    id: Uuid,
    config: AppConfig,
    cart: CartStore,
    favorites: FavoritesStore,
    database: Option<Database>,
    span: Span,
}

impl AppSession {
    /// Opens the on-device database and creates both stores.
    ///
    /// The favorites load is started but not awaited; call
    /// [`FavoritesStore::ready`] where a screen needs the full list.
    pub async fn start(config: AppConfig) -> StateResult<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        let span = info_span!("session", session_id = %id);

        let database = async {
            let path = config.storage.resolved_database_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let db_config = DbConfig::new(path).max_connections(config.storage.max_connections);
            let database = Database::new(db_config).await?;
            StateResult::Ok(database)
        }
        .instrument(span.clone())
        .await?;

        let store: Arc<dyn KeyValueStore> = Arc::new(database.kv());
        let session = Self::assemble(id, span, config, store, Some(database));

        session
            .span
            .in_scope(|| info!(key = %session.favorites.storage_key(), "Session started"));
        Ok(session)
    }

    /// Builds a session over any key-value store, e.g. a
    /// [`MemoryStore`](cartwise_db::MemoryStore) for previews.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn with_store(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let id = Uuid::new_v4();
        let span = info_span!("session", session_id = %id);
        Self::assemble(id, span, config, store, None)
    }

    fn assemble(
        id: Uuid,
        span: Span,
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        database: Option<Database>,
    ) -> Self {
        let favorites = {
            let _entered = span.enter();
            FavoritesStore::new(store, config.storage.favorites_key.clone())
        };

        AppSession {
            id,
            config,
            cart: CartStore::new(),
            favorites,
            database,
            span,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the session's cart.
    pub fn cart(&self) -> CartStore {
        self.cart.clone()
    }

    /// Handle to the session's favorites.
    pub fn favorites(&self) -> FavoritesStore {
        self.favorites.clone()
    }

    /// Writes any favorites change that is not on disk yet, then closes the
    /// database. A failed final write is logged and the session still
    /// closes.
    pub async fn shutdown(self) {
        let AppSession {
            favorites,
            database,
            span,
            ..
        } = self;

        async move {
            favorites.ready().await;
            if let Err(e) = favorites.flush().await {
                warn!(error = %e, "Final favorites write failed");
            }
            if let Some(database) = database {
                database.close().await;
            }
            info!("Session closed");
        }
        .instrument(span)
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwise_core::{Money, Product};
    use cartwise_db::MemoryStore;

    fn file_config(dir: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.database_path = Some(dir.path().join("data").join("cartwise.db"));
        config
    }

    fn product(id: &str) -> Product {
        Product {
            product_id: Some(id.to_string()),
            master_product_id: Some(format!("m-{}", id)),
            name: Some("Rice".to_string()),
            price: Some(Money::from_cents(199)),
            ..Product::default()
        }
    }

    #[tokio::test]
    async fn test_favorites_survive_session_restart() {
        let dir = tempfile::tempdir().unwrap();

        let session = AppSession::start(file_config(&dir)).await.unwrap();
        let favorites = session.favorites();
        favorites.ready().await;
        favorites.add_favorite(product("11"));
        session.cart().add_to_cart(product("11"));
        session.shutdown().await;

        let session = AppSession::start(file_config(&dir)).await.unwrap();
        let favorites = session.favorites();
        favorites.ready().await;

        assert!(favorites.is_favorite(11u64));
        assert!(session.cart().is_empty());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = file_config(&dir);
        config.storage.max_connections = 0;

        let err = AppSession::start(config).await.unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_with_memory_store() {
        let memory = Arc::new(MemoryStore::new());
        let session = AppSession::with_store(AppConfig::default(), memory.clone());

        session.favorites().ready().await;
        session
            .favorites()
            .add_favorite(product("3"))
            .outcome()
            .await
            .unwrap();

        assert!(memory.get("favorites").await.unwrap().is_some());
        assert_eq!(session.favorites().storage_key(), "favorites");
    }

    #[tokio::test]
    async fn test_sessions_have_distinct_ids() {
        let a = AppSession::with_store(AppConfig::default(), Arc::new(MemoryStore::new()));
        let b = AppSession::with_store(AppConfig::default(), Arc::new(MemoryStore::new()));
        assert_ne!(a.id(), b.id());
    }
}
