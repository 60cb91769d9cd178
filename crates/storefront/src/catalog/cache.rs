//! Cache types for catalog API responses.

use dummymart_core::{Product, ProductId};

use super::types::{Category, ProductPage, ProductQuery};

/// Cache key for products, pages and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Page(ProductQuery),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(ProductPage),
    Categories(Vec<Category>),
}
