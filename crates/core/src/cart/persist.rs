//! Storage envelope for cart snapshots.
//!
//! A snapshot is stored as
//!
//! ```json
//! {"state":{"items":[{"id":5,"title":"Pen","price":"2","quantity":1}]},"version":0}
//! ```
//!
//! Decoding is lenient about individual lines: a missing `quantity` reads
//! as 1, lines with a non-positive quantity are dropped, and duplicate ids
//! keep their first occurrence. Anything structurally wrong is an error the
//! caller is expected to answer with an empty cart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CartLineItem, CartState};
use crate::types::Product;

/// Envelope version written by this build.
pub const CART_STORAGE_VERSION: u32 = 0;

/// Errors decoding a stored cart.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Stored value is not a valid envelope.
    #[error("malformed cart data: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored value was written by an incompatible version.
    #[error("cart data version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a CartState,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: StoredState,
    #[serde(default)]
    version: u32,
}

#[derive(Deserialize)]
struct StoredState {
    #[serde(default)]
    items: Vec<StoredLineItem>,
}

#[derive(Deserialize)]
struct StoredLineItem {
    #[serde(flatten)]
    product: Product,
    #[serde(default)]
    quantity: Option<i64>,
}

impl StoredLineItem {
    fn into_line_item(self) -> Option<CartLineItem> {
        let quantity = match self.quantity {
            None => 1,
            Some(q) if q <= 0 => return None,
            Some(q) => u32::try_from(q).unwrap_or(u32::MAX),
        };
        Some(CartLineItem {
            product: self.product,
            quantity,
        })
    }
}

/// Serialize a snapshot into its storage envelope.
///
/// # Errors
///
/// Returns an error only if a product's extra fields cannot be serialized,
/// which does not happen for values that came from JSON.
pub fn encode(state: &CartState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        state,
        version: CART_STORAGE_VERSION,
    })
}

/// Parse a storage envelope back into a valid snapshot.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] for malformed data and
/// [`DecodeError::VersionMismatch`] for envelopes from another version.
pub fn decode(raw: &str) -> Result<CartState, DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version != CART_STORAGE_VERSION {
        return Err(DecodeError::VersionMismatch {
            found: envelope.version,
            expected: CART_STORAGE_VERSION,
        });
    }

    Ok(CartState::from_items(
        envelope
            .state
            .items
            .into_iter()
            .filter_map(StoredLineItem::into_line_item),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::ProductId;

    #[test]
    fn test_roundtrip_mixed_quantities() {
        let mut lipstick = Product::new(ProductId::new(3), "Lipstick", Decimal::new(1299, 2));
        lipstick.brand = Some("Chic Cosmetics".to_string());
        lipstick
            .extra
            .insert("sku".to_string(), serde_json::json!("BEA-CHI-LIP-004"));
        let pen = Product::new(ProductId::new(5), "Pen", Decimal::new(2, 0));

        let state = CartState::default()
            .with_added(&lipstick)
            .with_added(&pen)
            .with_added(&lipstick)
            .with_added(&lipstick);

        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.items()[0].quantity, 3);
        assert_eq!(decoded.items()[0].product.extra["sku"], "BEA-CHI-LIP-004");
    }

    #[test]
    fn test_envelope_shape() {
        let state = CartState::default().with_added(&Product::new(
            ProductId::new(5),
            "Pen",
            Decimal::new(2, 0),
        ));
        let value: serde_json::Value = serde_json::from_str(&encode(&state).unwrap()).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["items"][0]["id"], 5);
        assert_eq!(value["state"]["items"][0]["quantity"], 1);
    }

    #[test]
    fn test_decode_accepts_numeric_prices_and_missing_quantity() {
        let state =
            decode(r#"{"state":{"items":[{"id":1,"title":"A","price":9.99}]},"version":0}"#)
                .unwrap();
        assert_eq!(state.items()[0].quantity, 1);
        assert_eq!(state.items()[0].product.price, Decimal::new(999, 2));
    }

    #[test]
    fn test_decode_drops_non_positive_quantities() {
        let state = decode(
            r#"{"state":{"items":[
                {"id":1,"title":"A","price":1,"quantity":0},
                {"id":2,"title":"B","price":1,"quantity":-3},
                {"id":3,"title":"C","price":1,"quantity":2}
            ]},"version":0}"#,
        )
        .unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.items()[0].id(), ProductId::new(3));
    }

    #[test]
    fn test_decode_collapses_duplicate_ids() {
        let state = decode(
            r#"{"state":{"items":[
                {"id":1,"title":"First","price":1,"quantity":2},
                {"id":1,"title":"Second","price":1,"quantity":5}
            ]},"version":0}"#,
        )
        .unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.items()[0].product.title, "First");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode(r#"{"state":{"items":[{"id":"x"}]},"version":0}"#),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let err = decode(r#"{"state":{"items":[]},"version":3}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::VersionMismatch {
                found: 3,
                expected: 0
            }
        ));
    }
}
