//! # Cart State
//!
//! The canonical "what is in the shopping cart" for one app session.
//! In memory only; a restart starts with an empty cart.
//!
//! ## Snapshots
//! The current cart is an immutable [`Cart`] behind an `Arc`. Every
//! mutation builds the next cart from the previous one and swaps it in, so a
//! screen holding an older snapshot keeps rendering consistent data.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  UI Action                Store Method               Next Snapshot      │
//! │  ─────────                ────────────               ─────────────      │
//! │                                                                         │
//! │  Tap "Add" ─────────────► add_to_cart() ───────────► qty+1 or push     │
//! │                                                                         │
//! │  Stepper ───────────────► update_item_quantity() ──► qty = n           │
//! │                                                     (n <= 0: remove)    │
//! │                                                                         │
//! │  Swipe to delete ───────► remove_item_from_cart() ─► filter out        │
//! │                                                                         │
//! │  "Clear cart" ──────────► clear_cart() ────────────► empty             │
//! │                                                                         │
//! │  Badge / footer ────────► cart_item_count()                             │
//! │                           cart_total() ─────────────► (read only)       │
//! │                                                                         │
//! │  Commit and notify happen under one lock; no-ops notify nobody.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use cartwise_core::{CartItem, Money, Product, ProductKey};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

// =============================================================================
// Cart Snapshot
// =============================================================================

/// One immutable version of the cart.
///
/// ## Invariants
/// - Items are unique by [`CartItem::key`]
/// - Every quantity is at least 1
/// - Items keep the order they were first added in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Items in the order they were first added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Finds the line for `key`.
    pub fn get(&self, key: &ProductKey) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities, for the cart badge.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of every line's effective price × quantity.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    fn position(&self, key: &ProductKey) -> Option<usize> {
        self.items.iter().position(|item| &item.key() == key)
    }
}

/// Cart totals summary for the cart footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub line_count: usize,
    pub item_count: u64,
    pub total: Money,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            line_count: cart.len(),
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Handle to the session's cart.
///
/// Clones share the same cart. Create one per session and hand it to the
/// screens that need it.
///
/// ## Usage
/// ```rust,ignore
/// let cart = CartStore::new();
/// let mut changes = cart.subscribe();
///
/// cart.add_to_cart(product);
/// changes.changed().await?;
/// render(&changes.borrow_and_update());
/// ```
#[derive(Debug, Clone)]
pub struct CartStore {
    state: Arc<watch::Sender<Arc<Cart>>>,
}

impl CartStore {
    /// Creates an empty cart.
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(Cart::default()));
        CartStore {
            state: Arc::new(state),
        }
    }

    /// Adds one unit of `product`.
    ///
    /// A product already in the cart (same [`Product::cart_key`]) gets its
    /// quantity bumped instead of a second line. Returns the line's quantity
    /// after the add.
    pub fn add_to_cart(&self, product: Product) -> u32 {
        let key = product.cart_key();
        let mut quantity = 0;

        self.commit(|cart| {
            let mut items = cart.items.clone();
            match cart.position(&key) {
                Some(index) => {
                    let current = items[index].quantity;
                    quantity = current.saturating_add(1);
                    if quantity == current {
                        return None;
                    }
                    items[index] = items[index].with_quantity(quantity);
                }
                None => {
                    quantity = 1;
                    items.push(CartItem::new(product));
                }
            }
            debug!(key = %key, quantity, "Cart item added");
            Some(Cart { items })
        });

        quantity
    }

    /// Sets the quantity of the line for `key`.
    ///
    /// A quantity of zero or less removes the line. An unknown key is a
    /// no-op.
    pub fn update_item_quantity(&self, key: impl Into<ProductKey>, quantity: i64) {
        let key = key.into();
        if quantity <= 0 {
            self.remove_item_from_cart(key);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        self.commit(|cart| {
            let index = cart.position(&key)?;
            if cart.items[index].quantity == quantity {
                return None;
            }
            let mut items = cart.items.clone();
            items[index] = items[index].with_quantity(quantity);
            debug!(key = %key, quantity, "Cart item quantity updated");
            Some(Cart { items })
        });
    }

    /// Removes the line for `key`. Removing an absent key is a no-op.
    pub fn remove_item_from_cart(&self, key: impl Into<ProductKey>) {
        let key = key.into();
        self.commit(|cart| {
            cart.position(&key)?;
            let items = cart
                .items
                .iter()
                .filter(|item| item.key() != key)
                .cloned()
                .collect();
            debug!(key = %key, "Cart item removed");
            Some(Cart { items })
        });
    }

    /// Empties the cart.
    pub fn clear_cart(&self) {
        self.commit(|cart| {
            if cart.is_empty() {
                return None;
            }
            debug!(lines = cart.len(), "Cart cleared");
            Some(Cart::default())
        });
    }

    /// Sum of all quantities.
    pub fn cart_item_count(&self) -> u64 {
        self.state.borrow().item_count()
    }

    /// Sum of effective price × quantity over all lines.
    pub fn cart_total(&self) -> Money {
        self.state.borrow().total()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary::from(&**self.state.borrow())
    }

    /// Current cart snapshot.
    pub fn snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.state.borrow())
    }

    /// Copy of the current lines.
    pub fn items(&self) -> Vec<CartItem> {
        self.state.borrow().items.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn contains(&self, key: impl Into<ProductKey>) -> bool {
        self.state.borrow().position(&key.into()).is_some()
    }

    /// Quantity of the line for `key`, 0 when absent.
    pub fn quantity_of(&self, key: impl Into<ProductKey>) -> u32 {
        self.state
            .borrow()
            .get(&key.into())
            .map_or(0, |item| item.quantity)
    }

    /// Receiver that is marked changed after every committed mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.state.subscribe()
    }

    /// Swaps in the cart `f` builds from the current one and notifies
    /// subscribers. `None` leaves the cart alone and notifies nobody.
    fn commit<F>(&self, f: F)
    where
        F: FnOnce(&Cart) -> Option<Cart>,
    {
        self.state.send_if_modified(|current| match f(current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        });
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwise_core::RawProduct;

    fn test_product(master: &str, price_cents: i64) -> Product {
        Product {
            master_product_id: Some(master.to_string()),
            name: Some(format!("Product {}", master)),
            price: Some(Money::from_cents(price_cents)),
            ..Product::default()
        }
    }

    #[test]
    fn test_add_same_product_twice_bumps_quantity() {
        let cart = CartStore::new();
        let product = test_product("m-1", 999);

        assert_eq!(cart.add_to_cart(product.clone()), 1);
        assert_eq!(cart.add_to_cart(product), 2);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of("m-1"), 2);
        assert_eq!(cart.cart_item_count(), 2);
    }

    #[test]
    fn test_cart_keys_on_master_id() {
        let cart = CartStore::new();
        let mut a = test_product("m-1", 100);
        a.product_id = Some("1".to_string());
        let mut b = test_product("m-1", 100);
        b.product_id = Some("2".to_string());

        cart.add_to_cart(a);
        cart.add_to_cart(b);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of("m-1"), 2);
    }

    #[test]
    fn test_update_to_zero_removes_item() {
        let cart = CartStore::new();
        let product = test_product("m-1", 999);
        cart.add_to_cart(product.clone());
        cart.add_to_cart(product);
        cart.add_to_cart(test_product("m-2", 100));
        assert_eq!(cart.cart_item_count(), 3);

        cart.update_item_quantity("m-1", 0);

        assert!(!cart.contains("m-1"));
        assert_eq!(cart.cart_item_count(), 1);
    }

    #[test]
    fn test_update_negative_quantity_removes_item() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 999));

        cart.update_item_quantity("m-1", -4);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_sets_quantity() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 250));

        cart.update_item_quantity("m-1", 4);

        assert_eq!(cart.quantity_of("m-1"), 4);
        assert_eq!(cart.cart_total().cents(), 1000);
    }

    #[test]
    fn test_update_unknown_key_is_noop() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 250));
        let before = cart.snapshot();

        cart.update_item_quantity("missing", 3);

        assert_eq!(*cart.snapshot(), *before);
    }

    #[test]
    fn test_remove_absent_key_leaves_cart_unchanged() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 250));
        cart.add_to_cart(test_product("m-2", 300));
        let before = cart.snapshot();

        cart.remove_item_from_cart("m-3");

        assert_eq!(*cart.snapshot(), *before);
        assert!(Arc::ptr_eq(&cart.snapshot(), &before));
    }

    #[test]
    fn test_total_uses_price_fallback() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("a", 1000));
        cart.add_to_cart(test_product("a", 1000));

        let fallback = Product::from(RawProduct {
            masterproductid: Some("b".to_string()),
            price: Some(f64::NAN),
            lowest_price: Some(5.0),
            ..RawProduct::default()
        });
        cart.add_to_cart(fallback);

        assert_eq!(cart.cart_total().cents(), 2500);
    }

    #[test]
    fn test_unpriced_items_contribute_nothing() {
        let cart = CartStore::new();
        cart.add_to_cart(Product {
            master_product_id: Some("no-price".to_string()),
            ..Product::default()
        });
        cart.add_to_cart(test_product("m-1", 300));

        assert_eq!(cart.cart_item_count(), 2);
        assert_eq!(cart.cart_total().cents(), 300);
    }

    #[test]
    fn test_clear_cart() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 300));
        assert!(!cart.is_empty());

        cart.clear_cart();

        assert!(cart.is_empty());
        assert_eq!(cart.cart_total(), Money::zero());
    }

    #[test]
    fn test_old_snapshots_are_not_mutated() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 300));
        let before = cart.snapshot();

        cart.add_to_cart(test_product("m-1", 300));

        assert_eq!(before.get(&ProductKey::from("m-1")).map(|i| i.quantity), Some(1));
        assert_eq!(cart.quantity_of("m-1"), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let cart = CartStore::new();
        let other = cart.clone();

        other.add_to_cart(test_product("m-1", 300));

        assert!(cart.contains("m-1"));
    }

    #[test]
    fn test_summary() {
        let cart = CartStore::new();
        cart.add_to_cart(test_product("m-1", 300));
        cart.add_to_cart(test_product("m-1", 300));
        cart.add_to_cart(test_product("m-2", 150));

        let summary = cart.summary();
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total.cents(), 750);
    }

    #[tokio::test]
    async fn test_subscribers_see_commits_but_not_noops() {
        let cart = CartStore::new();
        let mut changes = cart.subscribe();

        cart.remove_item_from_cart("missing");
        cart.clear_cart();
        assert!(!changes.has_changed().unwrap());

        cart.add_to_cart(test_product("m-1", 300));
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().item_count(), 1);
        assert!(!changes.has_changed().unwrap());
    }
}
