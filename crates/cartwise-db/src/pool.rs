//! # SQLite Pool
//!
//! Opens the on-device database file and hands out key-value repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  AppSession::start                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────┐                                        │
//! │  │        SqlitePool           │                                        │
//! │  │  ┌─────┐ ┌─────┐            │  (max_connections, default 2)          │
//! │  │  │Conn1│ │Conn2│            │                                        │
//! │  │  └─────┘ └─────┘            │                                        │
//! │  └─────────────────────────────┘                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.kv() ──► KvRepository ──► FavoritesStore persistence                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL so the startup load never waits on a write.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::kv::KvRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Path of the special in-memory database.
const IN_MEMORY: &str = ":memory:";

/// Connections to a database file are recycled after this long.
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// How to open the on-device database.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/cartwise.db")
///     .max_connections(2)
///     .connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,

    /// Pool size. Default: 2, one reader and one writer.
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// How long to wait for a free connection. Default: 10s
    pub connect_timeout: Duration,

    /// Idle connections above the minimum close after this. Default: 10min
    pub idle_timeout: Duration,

    /// Apply pending migrations when the pool opens. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Config for the database file at `path`.
    ///
    /// The file is created if it doesn't exist; its directory must.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            ..Self::in_memory()
        }
        .max_connections(2)
        .idle_timeout(Duration::from_secs(10 * 60))
        .connect_timeout(Duration::from_secs(10))
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig { max_connections, ..self }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        DbConfig { connect_timeout, ..self }
    }

    pub fn idle_timeout(self, idle_timeout: Duration) -> Self {
        DbConfig { idle_timeout, ..self }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig { run_migrations, ..self }
    }

    /// Private in-memory database for tests and previews.
    ///
    /// One connection that is never reaped, so the data lives as long as
    /// the pool.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()));
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.database_path)
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL is durable across app crashes, which is all a phone needs
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Database handle providing repository access.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database, creating the file if needed, and runs migrations
    /// when the config asks for it.
    ///
    /// Fails with [`DbError::ConnectionFailed`] or
    /// [`DbError::MigrationFailed`].
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let connect_options = config.connect_options()?;

        // Closing the only in-memory connection would drop the database
        let in_memory = config.is_in_memory();
        let idle_timeout = (!in_memory).then_some(config.idle_timeout);
        let max_lifetime = (!in_memory).then_some(MAX_CONNECTION_LIFETIME);

        let options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(idle_timeout)
            .max_lifetime(max_lifetime);

        let database = Database {
            pool: options
                .connect_with(connect_options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };
        debug!(max_connections = config.max_connections, "Pool ready");

        if config.run_migrations {
            database.run_migrations().await?;
        }

        Ok(database)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the key-value repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let favorites = db.kv().get("favorites").await?;
    /// ```
    pub fn kv(&self) -> KvRepository {
        KvRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later operations fail with
    /// [`DbError::Unavailable`].
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KeyValueStore;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        db.kv().set("k", "v").await.unwrap();
        assert_eq!(db.kv().get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartwise.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_closed_pool_reports_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
        let err = db.kv().get("k").await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/data/cartwise.db")
            .max_connections(4)
            .run_migrations(false);

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
