//! # cartwise-core: Pure Domain Logic for Cartwise
//!
//! Product normalization, money, and input validation shared by the cart and
//! favorites stores. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (screens)                          │   │
//! │  │   Search ──► Product ──► Cart ──► Favorites ──► Statistics      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          cartwise-state (CartStore, FavoritesStore)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cartwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │ normalize │  │   money   │  │ validation│   │   │
//! │  │   │  Product  │  │RawProduct │  │   Money   │  │   query   │   │   │
//! │  │   │ CartItem  │  │ SearchResp│  │           │  │   email   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Normalized records (Product, CartItem, FavoriteRecord)
//! - [`normalize`] - Boundary adapter from raw API/persisted JSON
//! - [`money`] - Money type with integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - User-input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cartwise_core::normalize::parse_search_response;
//!
//! let body = r#"[{"product_id": 42, "name": "Oat Milk", "price": "NaN", "lowest_price": 3.49}]"#;
//! let products = parse_search_response(body).unwrap();
//!
//! assert_eq!(products[0].identity().as_str(), "42");
//! assert_eq!(products[0].price.unwrap().cents(), 349);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod normalize;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::{parse_search_response, RawProduct, SearchResponse};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key the favorites list is persisted under.
pub const FAVORITES_STORAGE_KEY: &str = "favorites";

/// Identity of a product that carries neither `product_id` nor
/// `masterproductid`.
pub const FALLBACK_PRODUCT_KEY: &str = "0";

/// Label rendered instead of a price when the fallback chain finds none.
pub const UNAVAILABLE_PRICE_LABEL: &str = "Price unavailable";

/// Maximum length of a search query, in characters.
pub const MAX_SEARCH_QUERY_LEN: usize = 200;
