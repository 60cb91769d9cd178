//! Request and response types for the product catalog API.

use serde::{Deserialize, Serialize};

use dummymart_core::{Product, UserId};

// =============================================================================
// Query Types
// =============================================================================

/// Title ordering requested from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    None,
    /// Title A-Z.
    Asc,
    /// Title Z-A.
    Desc,
}

impl SortOrder {
    /// Value of the API's `order` parameter, if any.
    #[must_use]
    pub const fn as_param(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Asc => Some("asc"),
            Self::Desc => Some("desc"),
        }
    }
}

/// Which product set a listing page is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductSource {
    /// Every product.
    All,
    /// Full-text search results.
    Search(String),
    /// Products in one category (by slug).
    Category(String),
}

/// One page request against the product listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub source: ProductSource,
    pub sort: SortOrder,
    pub limit: u32,
    pub skip: u32,
}

// =============================================================================
// Response Types
// =============================================================================

/// A page of products.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
}

impl ProductPage {
    /// Whether more products follow this page.
    ///
    /// An empty page always ends the listing, even if `total` disagrees.
    #[must_use]
    pub fn has_more(&self) -> bool {
        let fetched = self
            .skip
            .saturating_add(u32::try_from(self.products.len()).unwrap_or(u32::MAX));
        !self.products.is_empty() && fetched < self.total
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
}

/// User record returned by a successful login.
///
/// Token fields in the response are not kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Error body returned by the API on rejected requests.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(count: usize, total: u32, skip: u32) -> ProductPage {
        let products = (0..count)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": i,
                    "title": format!("Product {i}"),
                    "price": 1
                }))
                .unwrap()
            })
            .collect();
        ProductPage {
            products,
            total,
            skip,
            limit: 12,
        }
    }

    #[test]
    fn test_has_more() {
        assert!(page(12, 194, 0).has_more());
        assert!(!page(2, 194, 192).has_more());
        assert!(!page(0, 194, 0).has_more());
        assert!(!page(12, 12, 0).has_more());
    }

    #[test]
    fn test_sort_order_params() {
        assert_eq!(SortOrder::None.as_param(), None);
        assert_eq!(SortOrder::Asc.as_param(), Some("asc"));
        assert_eq!(SortOrder::Desc.as_param(), Some("desc"));
    }

    #[test]
    fn test_sort_order_deserializes_lowercase() {
        let sort: SortOrder = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(sort, SortOrder::Desc);
    }

    #[test]
    fn test_login_response_ignores_tokens() {
        let user: LoginResponse = serde_json::from_str(
            r#"{"id":1,"username":"emilys","email":"emily.johnson@x.dummyjson.com",
                "firstName":"Emily","lastName":"Johnson","gender":"female",
                "image":"https://dummyjson.com/icon/emilys/128",
                "accessToken":"eyJhbGciOi","refreshToken":"eyJhbGciOi"}"#,
        )
        .unwrap();
        assert_eq!(user.username, "emilys");
        assert_eq!(user.first_name.as_deref(), Some("Emily"));
    }
}
