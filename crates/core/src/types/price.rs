//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog quotes every price in US dollars as a JSON number. Amounts are
//! kept as [`Decimal`] so that line and order totals never pick up binary
//! floating point error.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the catalog's currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }
}

impl fmt::Display for Price {
    /// Formats as symbol plus two decimal places, e.g. `$19.99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        )
    }
}

/// ISO 4217 currency codes the catalog quotes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_price_display_pads_to_two_places() {
        assert_eq!(Price::usd(Decimal::new(2, 0)).to_string(), "$2.00");
        assert_eq!(Price::usd(Decimal::new(1999, 2)).to_string(), "$19.99");
    }

    #[test]
    fn test_price_display_rounds() {
        assert_eq!(Price::usd(Decimal::new(10_005, 3)).to_string(), "$10.01");
    }

    #[test]
    fn test_price_serializes_with_iso_code() {
        let json = serde_json::to_value(Price::usd(Decimal::new(250, 2))).unwrap();
        assert_eq!(json["currency_code"], "USD");
        assert_eq!(json["amount"], "2.50");
    }
}
