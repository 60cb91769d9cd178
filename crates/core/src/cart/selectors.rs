//! Derived reads over a cart snapshot.
//!
//! Views never compute cart figures themselves; they call these. Every
//! function tolerates an empty cart and returns zero / `false` for it.

use rust_decimal::Decimal;

use super::{CartLineItem, CartState};
use crate::types::ProductId;

/// Total units in the cart (not the number of distinct lines).
#[must_use]
pub fn cart_count(state: &CartState) -> u64 {
    state
        .items()
        .iter()
        .map(|item| u64::from(item.quantity))
        .sum()
}

/// Whether a line exists for `id`, regardless of quantity.
#[must_use]
pub fn is_in_cart(state: &CartState, id: ProductId) -> bool {
    state.get(id).is_some()
}

/// `price * quantity` for one line.
#[must_use]
pub fn line_total(item: &CartLineItem) -> Decimal {
    item.product.price * Decimal::from(item.quantity)
}

/// Sum of [`line_total`] over `items`.
#[must_use]
pub fn order_total(items: &[CartLineItem]) -> Decimal {
    items.iter().map(line_total).sum()
}
