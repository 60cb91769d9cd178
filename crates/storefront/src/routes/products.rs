//! Product route handlers.
//!
//! The listing itself is rendered by the home page; this module serves the
//! infinite-scroll feed fragment and the product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use dummymart_core::{CartState, ProductId};

use super::views::{NavView, ProductCardView, ProductDetailView};
use crate::error::Result;
use crate::filters;
use crate::listing::ListingParams;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// One page of listing results, plus what to fetch next.
#[derive(Clone)]
pub struct FeedView {
    pub products: Vec<ProductCardView>,
    pub has_more: bool,
    pub next_query: String,
    pub error: Option<String>,
}

/// Listing feed fragment template (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_feed.html")]
pub struct ProductFeedTemplate {
    pub feed: FeedView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: NavView,
    pub product: ProductDetailView,
}

/// Fetch one listing page and mark the products already in the cart.
///
/// Products the previous page already showed are dropped. Catalog failures
/// are reported inside the feed rather than as an error response, so a
/// failed scroll shows a message instead of breaking the page.
pub(crate) async fn load_feed(state: &AppState, params: &ListingParams, cart: &CartState) -> FeedView {
    let query = params.to_query(state.config().listing.page_size);

    match state.catalog().list_products(&query).await {
        Ok(page) => {
            let seen = params.seen_ids();
            let shown: Vec<ProductId> = page.products.iter().map(|product| product.id).collect();

            FeedView {
                products: page
                    .products
                    .iter()
                    .filter(|product| !seen.contains(&product.id))
                    .map(|product| ProductCardView::new(product, cart))
                    .collect(),
                has_more: page.has_more(),
                next_query: params.next_page_query(&shown),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load product page");
            FeedView {
                products: Vec::new(),
                has_more: false,
                next_query: String::new(),
                error: Some("Failed to load products. Please try again.".to_string()),
            }
        }
    }
}

/// Next page of the product listing (HTMX).
#[instrument(skip(state, _user))]
pub async fn feed(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let cart = state.cart().snapshot();
    ProductFeedTemplate {
        feed: load_feed(&state, &params, &cart).await,
    }
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().get_product(id).await?;
    let cart = state.cart().snapshot();

    Ok(ProductShowTemplate {
        nav: NavView::new(user, &cart),
        product: ProductDetailView::new(&product, &cart),
    })
}
