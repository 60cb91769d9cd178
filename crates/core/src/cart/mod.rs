//! Cart state machine.
//!
//! # Model
//!
//! A [`CartState`] is an ordered list of [`CartLineItem`]s with two invariants:
//! - no two items share a [`ProductId`]
//! - every item's quantity is at least 1
//!
//! States are immutable values. Every operation is a pure function from one
//! state to the next ([`CartState::with_added`], [`CartState::without`],
//! [`CartState::with_increased`], [`CartState::with_decreased`]); the
//! [`CartStore`] publishes each result as a new `Arc<CartState>` snapshot,
//! persists it and notifies subscribers.
//!
//! # Modules
//!
//! - [`store`] - the shared state holder
//! - [`selectors`] - derived reads (count, membership, totals)
//! - [`persist`] - the storage envelope

pub mod persist;
pub mod selectors;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

pub use store::{CART_STORAGE_KEY, CartStore};

/// One product held in the cart, with its quantity.
///
/// The product record is copied at first add and never re-synced with the
/// catalog. Unknown product fields ride along in `product.extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartLineItem {
    /// Start a new line with quantity 1.
    ///
    /// A `quantity` carried in the product's extra fields is discarded; the
    /// line's own quantity is the only one.
    #[must_use]
    pub fn new(mut product: Product) -> Self {
        product.extra.remove("quantity");
        Self {
            product,
            quantity: 1,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.product.unit_price()
    }

    /// Line total as a displayable price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::usd(selectors::line_total(self))
    }
}

/// Snapshot of the cart contents.
///
/// Stored data enters through [`persist::decode`], which runs
/// [`CartState::from_items`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartState {
    items: Vec<CartLineItem>,
}

impl CartState {
    /// Build a state from raw line items, restoring the invariants.
    ///
    /// Later duplicates of an id are dropped and zero-quantity lines are
    /// removed, so any input yields a valid cart.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut normalized: Vec<CartLineItem> = Vec::new();
        for item in items {
            if item.quantity == 0 || normalized.iter().any(|i| i.id() == item.id()) {
                continue;
            }
            normalized.push(item);
        }
        Self { items: normalized }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines. See [`selectors::cart_count`] for units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Add one unit of `product`.
    ///
    /// An existing line for the same id is incremented in place; otherwise a
    /// new line with quantity 1 is appended.
    #[must_use]
    pub fn with_added(&self, product: &Product) -> Self {
        if self.get(product.id).is_some() {
            return self.with_increased(product.id);
        }

        let mut items = self.items.clone();
        items.push(CartLineItem::new(product.clone()));
        Self { items }
    }

    /// Drop the line for `id`, if any.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.id() != id)
                .cloned()
                .collect(),
        }
    }

    /// Add one unit to the line for `id`, if any.
    #[must_use]
    pub fn with_increased(&self, id: ProductId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|item| {
                    if item.id() == id {
                        CartLineItem {
                            quantity: item.quantity.saturating_add(1),
                            ..item.clone()
                        }
                    } else {
                        item.clone()
                    }
                })
                .collect(),
        }
    }

    /// Remove one unit from the line for `id`, dropping the line at zero.
    #[must_use]
    pub fn with_decreased(&self, id: ProductId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter_map(|item| {
                    if item.id() != id {
                        return Some(item.clone());
                    }
                    match item.quantity.saturating_sub(1) {
                        0 => None,
                        quantity => Some(CartLineItem {
                            quantity,
                            ..item.clone()
                        }),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i64, title: &str, price: i64) -> Product {
        Product::new(ProductId::new(id), title, Decimal::new(price, 0))
    }

    fn ids(state: &CartState) -> Vec<i64> {
        state.items().iter().map(|i| i.id().as_i64()).collect()
    }

    #[test]
    fn test_add_appends_with_quantity_one() {
        let state = CartState::default().with_added(&product(5, "Pen", 2));
        assert_eq!(state.len(), 1);
        assert_eq!(state.items()[0].quantity, 1);
        assert_eq!(state.items()[0].product.title, "Pen");
    }

    #[test]
    fn test_readd_merges_quantity() {
        let pen = product(5, "Pen", 2);
        let state = CartState::default().with_added(&pen).with_added(&pen);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(pen.id).map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_readd_keeps_position() {
        let state = CartState::default()
            .with_added(&product(1, "A", 1))
            .with_added(&product(2, "B", 1))
            .with_added(&product(1, "A", 1));
        assert_eq!(ids(&state), vec![1, 2]);
    }

    #[test]
    fn test_readd_keeps_first_snapshot_of_product() {
        let state = CartState::default()
            .with_added(&product(1, "Old title", 10))
            .with_added(&product(1, "New title", 99));
        let item = &state.items()[0];
        assert_eq!(item.product.title, "Old title");
        assert_eq!(item.product.price, Decimal::new(10, 0));
    }

    #[test]
    fn test_ids_stay_unique_across_many_adds() {
        let mut state = CartState::default();
        for id in [3, 1, 3, 2, 1, 3, 4, 2] {
            state = state.with_added(&product(id, "x", 1));
        }
        let mut seen = ids(&state);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), state.len());
        assert_eq!(ids(&state), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_without_missing_id_is_noop() {
        let state = CartState::default().with_added(&product(1, "A", 1));
        assert_eq!(state.without(ProductId::new(9)), state);
    }

    #[test]
    fn test_increase_missing_id_is_noop() {
        let state = CartState::default().with_added(&product(1, "A", 1));
        assert_eq!(state.with_increased(ProductId::new(9)), state);
    }

    #[test]
    fn test_decrease_to_zero_removes_line() {
        let state = CartState::default()
            .with_added(&product(1, "A", 1))
            .with_added(&product(2, "B", 1))
            .with_decreased(ProductId::new(1));
        assert_eq!(ids(&state), vec![2]);
        assert!(state.get(ProductId::new(1)).is_none());
    }

    #[test]
    fn test_decrease_keeps_line_above_zero() {
        let a = product(1, "A", 1);
        let state = CartState::default()
            .with_added(&a)
            .with_added(&a)
            .with_added(&a)
            .with_decreased(a.id);
        assert_eq!(state.get(a.id).map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_transforms_leave_source_untouched() {
        let before = CartState::default().with_added(&product(1, "A", 1));
        let _after = before.with_increased(ProductId::new(1));
        assert_eq!(before.items()[0].quantity, 1);
    }

    #[test]
    fn test_from_items_restores_invariants() {
        let mut zero = CartLineItem::new(product(3, "Zero", 1));
        zero.quantity = 0;
        let mut dup = CartLineItem::new(product(1, "Dup", 1));
        dup.quantity = 7;

        let state = CartState::from_items([
            CartLineItem::new(product(1, "A", 1)),
            zero,
            CartLineItem::new(product(2, "B", 1)),
            dup,
        ]);

        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.items()[0].quantity, 1);
    }

    #[test]
    fn test_line_item_missing_quantity_reads_as_one() {
        let item: CartLineItem =
            serde_json::from_str(r#"{"id":1,"title":"A","price":3}"#).unwrap();
        assert_eq!(item.quantity, 1);
        assert!(!item.product.extra.contains_key("quantity"));
    }

    #[test]
    fn test_new_line_drops_foreign_quantity_field() {
        let mut p = product(1, "A", 1);
        p.extra.insert("quantity".to_string(), serde_json::json!(40));
        let item = CartLineItem::new(p);
        assert_eq!(item.quantity, 1);
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json.matches("quantity").count(), 1);
    }
}
