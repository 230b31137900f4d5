//! # Favorites State
//!
//! The canonical "what the user has bookmarked", kept across restarts in
//! the on-device key-value store.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Favorites Store Lifecycle                            │
//! │                                                                         │
//! │  FavoritesStore::new(store, "favorites")                                │
//! │       │                                                                 │
//! │       ├──► is_loading = true ──► screens show a spinner                 │
//! │       │                                                                 │
//! │       ▼  (background)                                                   │
//! │  store.get("favorites") ──► JSON ──► Vec<FavoriteRecord>                │
//! │       │                                                                 │
//! │       │  read or parse failure: log, start empty                        │
//! │       ▼                                                                 │
//! │  persisted records ++ records added while loading                       │
//! │  is_loading = false                                                     │
//! │                                                                         │
//! │  add_favorite / remove_favorite / clear_favorites                       │
//! │       │                                                                 │
//! │       ├──► new snapshot, subscribers notified                           │
//! │       │                                                                 │
//! │       └──► PersistTicket ──► writer ──► store.set / store.delete        │
//! │                                 │                                       │
//! │                                 └── failure: logged, memory kept        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Ordering
//! Every committed mutation gets the next generation number. Writes go
//! through one writer lock and always store the *current* list, then
//! remember the generation they wrote. A write whose generation is already
//! covered is skipped, so an older list can never overwrite a newer one and
//! no mutation is lost.

use std::sync::Arc;

use cartwise_core::{FavoriteRecord, Product, ProductKey};
use cartwise_db::KeyValueStore;
use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::StateResult;

// =============================================================================
// Favorites Snapshot
// =============================================================================

/// One immutable version of the favorites list.
///
/// ## Invariants
/// - Records are unique by [`FavoriteRecord::identity`]
/// - Records keep insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorites {
    records: Vec<FavoriteRecord>,

    is_loading: bool,

    /// Generation of the last committed mutation.
    #[serde(skip)]
    generation: u64,

    /// Set by a clear; the next write deletes the key.
    #[serde(skip)]
    cleared: bool,

    /// A clear happened before the persisted list arrived. Only the merge
    /// resets it.
    #[serde(skip)]
    cleared_while_loading: bool,

    /// Removals made before the persisted list arrived.
    #[serde(skip)]
    removed_while_loading: Vec<ProductKey>,
}

impl Favorites {
    fn loading() -> Self {
        Favorites {
            is_loading: true,
            ..Favorites::default()
        }
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[FavoriteRecord] {
        &self.records
    }

    /// True until the persisted list has been read (or failed to read).
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn contains(&self, key: &ProductKey) -> bool {
        self.records.iter().any(|record| record.identity() == key)
    }

    pub fn get(&self, key: &ProductKey) -> Option<&FavoriteRecord> {
        self.records.iter().find(|record| record.identity() == key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Folds the persisted list into a list built while loading.
    ///
    /// Persisted records come first, then in-session additions; duplicates
    /// keep their first occurrence. A clear or removal made while loading
    /// also applies to the persisted records.
    fn merge_loaded(&self, persisted: Vec<FavoriteRecord>) -> Favorites {
        let persisted = if self.cleared_while_loading {
            Vec::new()
        } else {
            persisted
        };
        let mut records: Vec<FavoriteRecord> = Vec::with_capacity(persisted.len() + self.len());

        let candidates = persisted
            .into_iter()
            .filter(|record| !self.removed_while_loading.contains(record.identity()))
            .chain(self.records.iter().cloned());

        for record in candidates {
            if !records.iter().any(|r| r.identity() == record.identity()) {
                records.push(record);
            }
        }

        Favorites {
            records,
            is_loading: false,
            generation: self.generation,
            cleared: self.cleared,
            cleared_while_loading: false,
            removed_while_loading: Vec::new(),
        }
    }
}

// =============================================================================
// Persist Ticket
// =============================================================================

/// Handle to the background write a mutation scheduled.
///
/// Dropping the ticket leaves the write running; its failure is then only
/// logged. Await [`PersistTicket::outcome`] to observe it.
#[derive(Debug)]
pub enum PersistTicket {
    /// The mutation changed nothing, so nothing was written.
    Skipped,

    /// A write is in flight.
    Pending(JoinHandle<StateResult<()>>),
}

impl PersistTicket {
    pub fn is_pending(&self) -> bool {
        matches!(self, PersistTicket::Pending(_))
    }

    /// Waits for the write to finish.
    ///
    /// `Ok` also covers the case where a later mutation's write already
    /// stored a list that includes this change.
    pub async fn outcome(self) -> StateResult<()> {
        match self {
            PersistTicket::Skipped => Ok(()),
            PersistTicket::Pending(handle) => handle.await?,
        }
    }
}

// =============================================================================
// Favorites Store
// =============================================================================

/// Handle to the session's favorites.
///
/// Clones share the same list, storage and writer.
///
/// ## Usage
/// ```rust,ignore
/// let favorites = FavoritesStore::new(Arc::new(db.kv()), "favorites");
///
/// favorites.ready().await;
/// if !favorites.is_favorite(42u64) {
///     favorites.add_favorite(product); // fire and forget
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: watch::Sender<Arc<Favorites>>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    /// Highest generation known to be on disk.
    written: Mutex<u64>,
    runtime: Handle,
}

impl FavoritesStore {
    /// Creates the store and starts loading the persisted list in the
    /// background. [`is_loading`](Self::is_loading) is true until it lands.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime, like `tokio::spawn`.
    pub fn new(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let favorites = Self::unloaded(store, storage_key.into(), Handle::current());

        let shared = Arc::clone(&favorites.shared);
        favorites.shared.runtime.spawn(async move {
            shared.load_persisted().await;
        });

        favorites
    }

    /// Creates the store and waits for the persisted list.
    pub async fn load(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let favorites = Self::unloaded(store, storage_key.into(), Handle::current());
        favorites.shared.load_persisted().await;
        favorites
    }

    fn unloaded(store: Arc<dyn KeyValueStore>, storage_key: String, runtime: Handle) -> Self {
        let (state, _) = watch::channel(Arc::new(Favorites::loading()));
        FavoritesStore {
            shared: Arc::new(Shared {
                state,
                store,
                storage_key,
                written: Mutex::new(0),
                runtime,
            }),
        }
    }

    /// Waits until the initial load has finished.
    pub async fn ready(&self) {
        self.shared.loaded().await;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True when a favorite with this identity exists. Accepts the numeric
    /// or the string form of an id.
    pub fn is_favorite(&self, key: impl Into<ProductKey>) -> bool {
        self.shared.state.borrow().contains(&key.into())
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading
    }

    /// Copy of the current records.
    pub fn favorites(&self) -> Vec<FavoriteRecord> {
        self.shared.state.borrow().records.clone()
    }

    pub fn snapshot(&self) -> Arc<Favorites> {
        Arc::clone(&self.shared.state.borrow())
    }

    pub fn len(&self) -> usize {
        self.shared.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.borrow().is_empty()
    }

    pub fn storage_key(&self) -> &str {
        &self.shared.storage_key
    }

    /// Receiver that is marked changed after every committed mutation and
    /// when loading finishes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Favorites>> {
        self.shared.state.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Bookmarks `product`. A product whose identity is already present is
    /// a no-op and returns [`PersistTicket::Skipped`].
    pub fn add_favorite(&self, product: Product) -> PersistTicket {
        let record = FavoriteRecord::new(product, Utc::now());

        self.commit(|favorites| {
            if favorites.contains(record.identity()) {
                return None;
            }
            debug!(key = %record.identity(), "Favorite added");

            let mut next = favorites.clone();
            next.records.push(record);
            next.cleared = false;
            Some(next)
        })
    }

    /// Removes the favorite with this identity. Removing an absent identity
    /// after loading is a no-op.
    pub fn remove_favorite(&self, key: impl Into<ProductKey>) -> PersistTicket {
        let key = key.into();

        self.commit(|favorites| {
            let present = favorites.contains(&key);
            if !present && !favorites.is_loading {
                return None;
            }
            debug!(key = %key, "Favorite removed");

            let mut next = favorites.clone();
            next.records.retain(|record| record.identity() != &key);
            if next.is_loading {
                next.removed_while_loading.push(key);
            }
            Some(next)
        })
    }

    /// Empties the list and deletes the persisted entry.
    pub fn clear_favorites(&self) -> PersistTicket {
        self.commit(|favorites| {
            debug!(removed = favorites.len(), "Favorites cleared");
            Some(Favorites {
                is_loading: favorites.is_loading,
                cleared: true,
                cleared_while_loading: favorites.is_loading,
                ..Favorites::default()
            })
        })
    }

    /// Writes the current list unless it is already on disk.
    pub async fn flush(&self) -> StateResult<()> {
        let generation = self.shared.state.borrow().generation;
        if generation == 0 {
            return Ok(());
        }
        Arc::clone(&self.shared).write_latest(generation).await
    }

    /// Commits the list `f` builds, notifies subscribers when the visible
    /// list changed, and schedules a write.
    fn commit<F>(&self, f: F) -> PersistTicket
    where
        F: FnOnce(&Favorites) -> Option<Favorites>,
    {
        let mut committed = None;

        self.shared.state.send_if_modified(|current| {
            let Some(mut next) = f(current) else {
                return false;
            };
            next.generation = current.generation + 1;
            committed = Some(next.generation);

            let visible_change = next.records != current.records;
            *current = Arc::new(next);
            visible_change
        });

        match committed {
            Some(generation) => {
                let shared = Arc::clone(&self.shared);
                PersistTicket::Pending(self.shared.runtime.spawn(shared.write_latest(generation)))
            }
            None => PersistTicket::Skipped,
        }
    }
}

impl Shared {
    async fn loaded(&self) {
        let mut changes = self.state.subscribe();
        // The sender lives in `self`, so this cannot fail.
        let _ = changes.wait_for(|favorites| !favorites.is_loading).await;
    }

    async fn load_persisted(&self) {
        let persisted = match self.read_persisted().await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    key = %self.storage_key,
                    error = %e,
                    "Failed to load favorites, starting with an empty list"
                );
                Vec::new()
            }
        };
        let loaded = persisted.len();

        self.state.send_modify(|current| {
            *current = Arc::new(current.merge_loaded(persisted));
        });

        info!(key = %self.storage_key, loaded, "Favorites loaded");
    }

    async fn read_persisted(&self) -> StateResult<Vec<FavoriteRecord>> {
        let Some(json) = self.store.get(&self.storage_key).await? else {
            return Ok(Vec::new());
        };
        let records: Option<Vec<FavoriteRecord>> = serde_json::from_str(&json)?;
        Ok(records.unwrap_or_default())
    }

    /// Stores the current list on behalf of the mutation with `generation`.
    ///
    /// Waits for the initial load so a half-built list never replaces the
    /// persisted one.
    async fn write_latest(self: Arc<Self>, generation: u64) -> StateResult<()> {
        self.loaded().await;

        let mut written = self.written.lock().await;
        if *written >= generation {
            debug!(generation, written = *written, "Favorites already persisted");
            return Ok(());
        }

        let snapshot = Arc::clone(&self.state.borrow());
        match self.store_snapshot(&snapshot).await {
            Ok(()) => {
                *written = snapshot.generation;
                debug!(
                    key = %self.storage_key,
                    generation = snapshot.generation,
                    count = snapshot.len(),
                    "Favorites persisted"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    key = %self.storage_key,
                    error = %e,
                    "Failed to persist favorites, keeping the in-memory list"
                );
                Err(e)
            }
        }
    }

    async fn store_snapshot(&self, snapshot: &Favorites) -> StateResult<()> {
        if snapshot.cleared && snapshot.is_empty() {
            self.store.delete(&self.storage_key).await?;
        } else {
            let json = serde_json::to_string(&snapshot.records)?;
            self.store.set(&self.storage_key, &json).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
