//! # Repository Module
//!
//! SQLite-backed implementations of the storage contracts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FavoritesStore                                                         │
//! │       │                                                                 │
//! │       │  store.set("favorites", json)                                   │
//! │       ▼                                                                 │
//! │  KvRepository (impl KeyValueStore)                                      │
//! │  ├── get(&self, key)                                                    │
//! │  ├── set(&self, key, value)   ← upsert                                  │
//! │  └── delete(&self, key)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kv_store table                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`KvRepository`](kv::KvRepository) - String key-value rows

pub mod kv;
