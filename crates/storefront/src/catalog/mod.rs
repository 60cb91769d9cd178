//! Product catalog API client.
//!
//! Talks to a DummyJSON-compatible REST API for product listings, product
//! detail, categories and sign-in.

mod cache;
mod client;
pub mod types;

pub use client::CatalogClient;
pub use types::{Category, LoginResponse, ProductPage, ProductQuery, ProductSource, SortOrder};

use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse the JSON response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API refused the request and said why.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Any other non-success status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// The configured base URL cannot take path segments.
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}
