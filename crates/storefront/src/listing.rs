//! Product listing parameters.
//!
//! The listing page and its infinite-scroll feed share one query string:
//! `q`, `sort`, `category` and a zero-based `page`. A search term needs at
//! least [`MIN_SEARCH_CHARS`] characters and wins over a category filter.
//!
//! Feed requests also carry `seen`, the comma-separated ids of the page
//! before. Paging is offset-based, so if the catalog shifts between two
//! requests the head of a page can repeat the tail of the last one; those
//! products are dropped instead of being shown twice.

use std::collections::HashSet;

use serde::Deserialize;

use dummymart_core::ProductId;

use crate::catalog::{ProductQuery, ProductSource, SortOrder};

/// Shortest search term sent to the catalog.
pub const MIN_SEARCH_CHARS: usize = 2;

/// Listing query string as submitted by the page.
///
/// Every field is optional and blank values mean "unset", so the raw form
/// values can be passed through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub seen: String,
}

impl ListingParams {
    /// The search term, if it is long enough to use.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        let term = self.q.trim();
        (term.chars().count() >= MIN_SEARCH_CHARS).then_some(term)
    }

    /// The category slug, if set.
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        let slug = self.category.trim();
        (!slug.is_empty()).then_some(slug)
    }

    /// Requested title ordering. Unknown values fall back to catalog order.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        match self.sort.trim() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => SortOrder::None,
        }
    }

    /// Which product set to list.
    #[must_use]
    pub fn source(&self) -> ProductSource {
        if let Some(term) = self.search_term() {
            ProductSource::Search(term.to_string())
        } else if let Some(slug) = self.category_slug() {
            ProductSource::Category(slug.to_string())
        } else {
            ProductSource::All
        }
    }

    /// Catalog request for this page.
    #[must_use]
    pub fn to_query(&self, page_size: u32) -> ProductQuery {
        ProductQuery {
            source: self.source(),
            sort: self.sort_order(),
            limit: page_size,
            skip: self.page.saturating_mul(page_size),
        }
    }

    /// Products already shown by the previous page. Malformed ids are
    /// skipped.
    #[must_use]
    pub fn seen_ids(&self) -> HashSet<ProductId> {
        self.seen
            .split(',')
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    /// Query string for the page after this one, which has just shown
    /// `shown`.
    #[must_use]
    pub fn next_page_query(&self, shown: &[ProductId]) -> String {
        let seen = shown
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", self.q.trim())
            .append_pair("sort", self.sort.trim())
            .append_pair("category", self.category.trim())
            .append_pair("page", &self.page.saturating_add(1).to_string())
            .append_pair("seen", &seen)
            .finish()
    }
}
