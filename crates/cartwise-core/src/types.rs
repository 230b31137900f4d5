//! # Domain Types
//!
//! The normalized records the cart and favorites stores work with.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   RawProduct (boundary, see normalize.rs)                               │
//! │        │  Product::from(raw)                                            │
//! │        ▼                                                                │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │    CartItem     │   │   FavoriteRecord    │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  product_id     │──►│  product        │   │  identity           │   │
//! │  │  master_prod_id │   │  quantity (≥1)  │   │  product (both ids) │   │
//! │  │  name, image    │   │  added_at       │   │  favorited_at       │   │
//! │  │  price (Money)  │   └─────────────────┘   └─────────────────────┘   │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ProductKey: the one canonical string identity used for comparisons     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Identity Rules
//! - **Favorites** ([`Product::identity`]): `product_id` if present, else
//!   `masterproductid`, else `"0"`.
//! - **Cart** ([`Product::cart_key`]): `masterproductid`, else the favorites
//!   identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::normalize::RawProduct;
use crate::FALLBACK_PRODUCT_KEY;

// =============================================================================
// Product Key
// =============================================================================

/// Canonical string identity of a product.
///
/// Accepts either the numeric or the string form of an id, so
/// `ProductKey::from(42u64) == ProductKey::from("42")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export, type = "string")]
pub struct ProductKey(String);

impl ProductKey {
    /// The key used when a product carries no usable id at all.
    pub fn fallback() -> Self {
        ProductKey(FALLBACK_PRODUCT_KEY.to_string())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductKey {
    fn from(s: &str) -> Self {
        ProductKey(s.to_string())
    }
}

impl From<String> for ProductKey {
    fn from(s: String) -> Self {
        ProductKey(s)
    }
}

impl From<&String> for ProductKey {
    fn from(s: &String) -> Self {
        ProductKey(s.clone())
    }
}

impl From<&ProductKey> for ProductKey {
    fn from(key: &ProductKey) -> Self {
        key.clone()
    }
}

impl From<u64> for ProductKey {
    fn from(n: u64) -> Self {
        ProductKey(n.to_string())
    }
}

impl From<i64> for ProductKey {
    fn from(n: i64) -> Self {
        ProductKey(n.to_string())
    }
}

impl From<u32> for ProductKey {
    fn from(n: u32) -> Self {
        ProductKey(n.to_string())
    }
}

impl PartialEq<str> for ProductKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProductKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Product
// =============================================================================

/// A purchasable item after boundary normalization.
///
/// Every alias the data sources use has been collapsed into one field, so
/// store logic never branches on which spelling a record arrived with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Numeric catalog id, as a string. Only set when truthy (non-zero).
    pub product_id: Option<String>,

    /// Retailer-independent master id.
    pub master_product_id: Option<String>,

    /// Display name (`name` or `productName`).
    pub name: Option<String>,

    /// First usable image (`imageUrl`, `image_url`, `image`, `images[0]`).
    pub image_url: Option<String>,

    /// Effective price after the fallback chain. `None` renders as
    /// "Price unavailable".
    pub price: Option<Money>,

    pub brand: Option<String>,

    pub description: Option<String>,
}

impl Product {
    /// Identity used by the favorites store.
    ///
    /// `product_id` → `masterproductid` → `"0"`. Applied on every insert,
    /// lookup and removal. Empty ids count as absent.
    pub fn identity(&self) -> ProductKey {
        usable_id(&self.product_id)
            .or(usable_id(&self.master_product_id))
            .map(ProductKey::from)
            .unwrap_or_else(ProductKey::fallback)
    }

    /// Identity used by the cart store.
    ///
    /// The cart keys on `masterproductid`; a product without one falls back
    /// to [`Product::identity`].
    pub fn cart_key(&self) -> ProductKey {
        match usable_id(&self.master_product_id) {
            Some(id) => ProductKey::from(id),
            None => self.identity(),
        }
    }

    /// Name to render, with a placeholder for nameless records.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown product")
    }

    /// True when the product has a usable price.
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}

fn usable_id(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

// =============================================================================
// Cart Item
// =============================================================================

/// A product in the cart with its quantity.
///
/// ## Invariants
/// - `quantity >= 1` while the item is in a cart (a cart drops the item
///   instead of storing zero)
/// - One item per [`Product::cart_key`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,

    pub quantity: u32,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new line with quantity 1.
    pub fn new(product: Product) -> Self {
        CartItem {
            product,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// The key this line is deduplicated by.
    pub fn key(&self) -> ProductKey {
        self.product.cart_key()
    }

    /// Returns a copy with a different quantity.
    ///
    /// Existing lines are never edited in place; readers holding an older
    /// snapshot keep seeing the old quantity.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        CartItem {
            quantity,
            ..self.clone()
        }
    }

    /// Effective unit price × quantity.
    ///
    /// Lines without a usable price, or with a zero quantity from corrupt
    /// data, contribute nothing.
    pub fn line_total(&self) -> Money {
        if self.quantity == 0 {
            return Money::zero();
        }
        self.product
            .price
            .filter(Money::is_positive)
            .map(|price| price.multiply_quantity(self.quantity))
            .unwrap_or_default()
    }
}

// =============================================================================
// Favorite Record
// =============================================================================

/// A bookmarked product, normalized so that both identity spellings are set.
///
/// ## Stored Shape
/// Favorites are persisted as JSON that every older reader understands,
/// so each alias is written out:
/// ```json
/// {
///   "product_id": "42", "masterproductid": "42",
///   "name": "Oat Milk", "productName": "Oat Milk",
///   "imageUrl": "https://…", "image_url": "https://…", "image": "https://…",
///   "price": 3.49, "brand": "Oatly", "description": null,
///   "favoritedAt": "2026-01-01T00:00:00Z"
/// }
/// ```
/// Reading goes back through [`RawProduct`], so records written by any
/// version are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteRecord {
    identity: ProductKey,
    product: Product,
    favorited_at: DateTime<Utc>,
}

impl FavoriteRecord {
    /// Normalizes a product into a favorite.
    ///
    /// Missing `product_id` / `master_product_id` are filled from the
    /// identity, so a later lookup through either spelling resolves to the
    /// same key.
    pub fn new(product: Product, favorited_at: DateTime<Utc>) -> Self {
        let identity = product.identity();
        let mut product = product;
        if product.product_id.is_none() {
            product.product_id = Some(identity.to_string());
        }
        if product.master_product_id.is_none() {
            product.master_product_id = Some(identity.to_string());
        }
        FavoriteRecord {
            identity,
            product,
            favorited_at,
        }
    }

    /// Builds a record from any inbound shape.
    pub fn from_raw(raw: RawProduct) -> Self {
        let favorited_at = raw.favorited_at.unwrap_or_else(Utc::now);
        FavoriteRecord::new(Product::from(raw), favorited_at)
    }

    pub fn identity(&self) -> &ProductKey {
        &self.identity
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn favorited_at(&self) -> DateTime<Utc> {
        self.favorited_at
    }
}

/// JSON form with every alias populated.
#[derive(Serialize)]
struct StoredFavorite<'a> {
    product_id: &'a str,
    masterproductid: &'a str,
    name: Option<&'a str>,
    #[serde(rename = "productName")]
    product_name: Option<&'a str>,
    #[serde(rename = "imageUrl")]
    image_url_camel: Option<&'a str>,
    image_url: Option<&'a str>,
    image: Option<&'a str>,
    price: Option<f64>,
    brand: Option<&'a str>,
    description: Option<&'a str>,
    #[serde(rename = "favoritedAt")]
    favorited_at: DateTime<Utc>,
}

impl Serialize for FavoriteRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let product = &self.product;
        let identity = self.identity.as_str();
        let name = product.name.as_deref();
        let image = product.image_url.as_deref();

        StoredFavorite {
            product_id: product.product_id.as_deref().unwrap_or(identity),
            masterproductid: product.master_product_id.as_deref().unwrap_or(identity),
            name,
            product_name: name,
            image_url_camel: image,
            image_url: image,
            image,
            price: product.price.map(|p| p.as_decimal()),
            brand: product.brand.as_deref(),
            description: product.description.as_deref(),
            favorited_at: self.favorited_at,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FavoriteRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawProduct::deserialize(deserializer).map(FavoriteRecord::from_raw)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(product_id: Option<&str>, master: Option<&str>) -> Product {
        Product {
            product_id: product_id.map(String::from),
            master_product_id: master.map(String::from),
            name: Some("Oat Milk".to_string()),
            ..Product::default()
        }
    }

    #[test]
    fn test_identity_prefers_product_id() {
        assert_eq!(product(Some("7"), Some("m-7")).identity(), "7");
        assert_eq!(product(None, Some("m-7")).identity(), "m-7");
        assert_eq!(product(None, None).identity(), "0");
    }

    #[test]
    fn test_cart_key_prefers_master_id() {
        assert_eq!(product(Some("7"), Some("m-7")).cart_key(), "m-7");
        assert_eq!(product(Some("7"), None).cart_key(), "7");
        assert_eq!(product(None, None).cart_key(), "0");
    }

    #[test]
    fn test_product_key_serializes_as_plain_string() {
        let key = ProductKey::from(42u64);
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""42""#);
        let back: ProductKey = serde_json::from_str(r#""42""#).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_empty_ids_fall_through() {
        assert_eq!(product(Some(""), Some("m-7")).identity(), "m-7");
        assert_eq!(product(Some(""), Some("")).identity(), "0");
        assert_eq!(product(Some("7"), Some("")).cart_key(), "7");
    }

    #[test]
    fn test_product_key_numeric_and_string_forms_match() {
        assert_eq!(ProductKey::from(42u64), ProductKey::from("42"));
        assert_eq!(ProductKey::from(-3i64), ProductKey::from("-3"));
    }

    #[test]
    fn test_line_total() {
        let mut p = product(Some("1"), None);
        p.price = Some(Money::from_cents(1000));
        let item = CartItem::new(p).with_quantity(2);
        assert_eq!(item.line_total().cents(), 2000);
    }

    #[test]
    fn test_line_total_without_price_or_quantity_is_zero() {
        let item = CartItem::new(product(Some("1"), None)).with_quantity(3);
        assert!(item.line_total().is_zero());

        let mut p = product(Some("2"), None);
        p.price = Some(Money::from_cents(500));
        assert!(CartItem::new(p).with_quantity(0).line_total().is_zero());
    }

    #[test]
    fn test_with_quantity_leaves_original_untouched() {
        let item = CartItem::new(product(Some("1"), None));
        let bumped = item.with_quantity(5);
        assert_eq!(item.quantity, 1);
        assert_eq!(bumped.quantity, 5);
        assert_eq!(bumped.added_at, item.added_at);
    }

    #[test]
    fn test_favorite_record_populates_both_ids() {
        let record = FavoriteRecord::new(product(None, Some("42")), Utc::now());
        assert_eq!(record.identity(), &ProductKey::from("42"));
        assert_eq!(record.product().product_id.as_deref(), Some("42"));
        assert_eq!(record.product().master_product_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_favorite_record_json_carries_every_alias() {
        let mut p = product(Some("42"), None);
        p.image_url = Some("https://img/42.png".to_string());
        p.price = Some(Money::from_cents(349));
        let record = FavoriteRecord::new(p, Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["product_id"], "42");
        assert_eq!(json["masterproductid"], "42");
        assert_eq!(json["name"], "Oat Milk");
        assert_eq!(json["productName"], "Oat Milk");
        assert_eq!(json["imageUrl"], "https://img/42.png");
        assert_eq!(json["image_url"], "https://img/42.png");
        assert_eq!(json["image"], "https://img/42.png");
        assert_eq!(json["price"], 3.49);
    }

    #[test]
    fn test_favorite_record_reloads_from_its_own_json() {
        let record = FavoriteRecord::new(product(None, Some("m-9")), Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: FavoriteRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.identity(), record.identity());
        assert_eq!(back.favorited_at(), record.favorited_at());
        assert_eq!(back.product().name, record.product().name);
    }
}
