//! # cartwise-state: Cart and Favorites State for Cartwise
//!
//! The two state containers the screens render from, plus the session that
//! wires them to on-device storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Mobile UI (screens)                          │    │
//! │  │   Search    Cart    Favorites    Statistics    Store selector   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ subscribe() / mutators                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │              ★ cartwise-state (THIS CRATE) ★                    │    │
//! │  │                                                                 │    │
//! │  │   ┌────────────┐  ┌────────────────┐  ┌──────────────────────┐  │    │
//! │  │   │ CartStore  │  │ FavoritesStore │  │ AppSession/AppConfig │  │    │
//! │  │   │ (memory)   │  │ (persisted)    │  │ init_tracing         │  │    │
//! │  │   └────────────┘  └───────┬────────┘  └──────────────────────┘  │    │
//! │  └───────────────────────────┼─────────────────────────────────────┘    │
//! │                              │                                          │
//! │  ┌───────────────────────────▼─────┐   ┌─────────────────────────────┐  │
//! │  │ cartwise-db (KeyValueStore)     │   │ cartwise-core (Product, …)  │  │
//! │  └─────────────────────────────────┘   └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cartwise_state::{init_tracing, AppConfig, AppSession};
//!
//! # async fn run() -> cartwise_state::StateResult<()> {
//! let config = AppConfig::load_or_default(None);
//! init_tracing(&config.logging);
//!
//! let session = AppSession::start(config).await?;
//! let cart = session.cart();
//! let favorites = session.favorites();
//!
//! favorites.ready().await;
//! println!("{} favorites, cart total {}", favorites.len(), cart.cart_total());
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod error;
pub mod favorites;
pub mod logging;
pub mod session;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartStore, CartSummary};
pub use config::{AppConfig, DisplayConfig, LoggingConfig, StorageConfig};
pub use error::{StateError, StateResult};
pub use favorites::{Favorites, FavoritesStore, PersistTicket};
pub use logging::init_tracing;
pub use session::AppSession;
