//! Catalog product record.
//!
//! The product API returns far more than the cart or the views interpret.
//! Fields the storefront reads are typed; everything else is kept verbatim in
//! [`Product::extra`] so that a record survives a trip through the cart and
//! storage without losing data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product record as served by the catalog API.
///
/// Only `id`, `title` and `price` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// Fields not interpreted by DummyMart, carried along unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// Create a product with only the required fields set.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            description: None,
            category: None,
            brand: None,
            thumbnail: None,
            images: Vec::new(),
            rating: None,
            discount_percentage: None,
            stock: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Unit price in the catalog currency.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_product_deserializes() {
        let product: Product =
            serde_json::from_str(r#"{"id":5,"title":"Pen","price":2}"#).unwrap();
        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.title, "Pen");
        assert_eq!(product.price, Decimal::new(2, 0));
        assert!(product.extra.is_empty());
    }

    #[test]
    fn test_decimal_price_is_exact() {
        let product: Product =
            serde_json::from_str(r#"{"id":1,"title":"Mascara","price":9.99}"#).unwrap();
        assert_eq!(product.price, Decimal::new(999, 2));
    }

    #[test]
    fn test_unknown_fields_are_retained() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"title":"Mascara","price":9.99,"sku":"BEA-ESS-ESS-001",
                "dimensions":{"width":15.14,"height":13.08,"depth":22.99},
                "discountPercentage":10.48,"tags":["beauty","mascara"]}"#,
        )
        .unwrap();

        assert_eq!(product.discount_percentage, Some(10.48));
        assert_eq!(product.extra["sku"], "BEA-ESS-ESS-001");
        assert!(product.extra.contains_key("dimensions"));
        assert!(!product.extra.contains_key("discountPercentage"));

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["tags"][1], "mascara");
        assert_eq!(json["discountPercentage"], 10.48);
    }

    #[test]
    fn test_missing_price_is_rejected() {
        let result = serde_json::from_str::<Product>(r#"{"id":1,"title":"Free"}"#);
        assert!(result.is_err());
    }
}
