//! # cartwise-db: On-Device Storage for Cartwise
//!
//! A small string key-value store on SQLite, behind the [`KeyValueStore`]
//! trait the favorites store persists through.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwise Data Flow                               │
//! │                                                                         │
//! │  FavoritesStore (cartwise-state)                                        │
//! │       │  get("favorites") / set("favorites", json) / delete(...)        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   cartwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │ KvRepository  │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ MemoryStore   │    │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │    │ (kv.rs)       │    │ 001_kv.sql   │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cartwise.db (app data directory)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`kv`] - The `KeyValueStore` contract and the in-memory implementation
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQLite-backed implementation of the contract
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartwise_db::{Database, DbConfig, KeyValueStore};
//!
//! let db = Database::new(DbConfig::new("path/to/cartwise.db")).await?;
//! let kv = db.kv();
//!
//! kv.set("favorites", "[]").await?;
//! assert_eq!(kv.get("favorites").await?.as_deref(), Some("[]"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use kv::{KeyValueStore, MemoryStore};
pub use pool::{Database, DbConfig};
pub use repository::kv::KvRepository;
