//! Checkout form and order confirmation.
//!
//! No payment is taken; the form is accepted as entered and the order is
//! confirmed locally.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use dummymart_core::Price;
use dummymart_core::cart::CartState;
use dummymart_core::cart::selectors::{cart_count, order_total};

/// How the shopper intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    Cod,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Card, Self::Upi, Self::Cod];

    /// Form value.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Cod => "cod",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Credit / Debit Card",
            Self::Upi => "UPI",
            Self::Cod => "Cash on Delivery",
        }
    }
}

/// Submitted checkout form.
///
/// Card and UPI details are accepted by the form but never read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub payment: PaymentMethod,
}

/// Confirmation for a placed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub number: Uuid,
    pub placed_at: DateTime<Utc>,
    pub payment: PaymentMethod,
    pub ship_to: Option<String>,
    pub units: u64,
    pub total: Price,
}

impl PlacedOrder {
    /// Confirm an order for the given cart contents.
    ///
    /// Returns `None` for an empty cart.
    #[must_use]
    pub fn confirm(cart: &CartState, form: &CheckoutForm) -> Option<Self> {
        if cart.is_empty() {
            return None;
        }

        let name = form.full_name.trim();
        Some(Self {
            number: Uuid::new_v4(),
            placed_at: Utc::now(),
            payment: form.payment,
            ship_to: (!name.is_empty()).then(|| name.to_string()),
            units: cart_count(cart),
            total: Price::usd(order_total(cart.items())),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use dummymart_core::{Product, ProductId};

    use super::*;

    fn cart() -> CartState {
        let pen = Product::new(ProductId::new(1), "Pen", Decimal::new(250, 2));
        CartState::default().with_added(&pen).with_added(&pen)
    }

    #[test]
    fn test_confirm_empty_cart_is_refused() {
        assert!(PlacedOrder::confirm(&CartState::default(), &CheckoutForm::default()).is_none());
    }

    #[test]
    fn test_confirm_totals_cart() {
        let form = CheckoutForm {
            full_name: "  Emily Johnson ".to_string(),
            payment: PaymentMethod::Cod,
            ..CheckoutForm::default()
        };
        let order = PlacedOrder::confirm(&cart(), &form).unwrap();

        assert_eq!(order.units, 2);
        assert_eq!(order.total.to_string(), "$5.00");
        assert_eq!(order.ship_to.as_deref(), Some("Emily Johnson"));
        assert_eq!(order.payment, PaymentMethod::Cod);
    }

    #[test]
    fn test_form_defaults_to_card() {
        let form: CheckoutForm = serde_json::from_str(r#"{"full_name":"A"}"#).unwrap();
        assert_eq!(form.payment, PaymentMethod::Card);
        assert_eq!(form.city, "");
    }
}
