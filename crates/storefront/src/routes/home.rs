//! Home page route handler: the product listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use super::products::{FeedView, load_feed};
use super::views::NavView;
use crate::catalog::Category;
use crate::filters;
use crate::listing::ListingParams;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub params: ListingParams,
    pub categories: Vec<Category>,
    pub feed: FeedView,
    pub search_debounce_ms: u64,
}

/// Display the home page with the first listing page.
///
/// Filters in the query string are honoured so a reload keeps them; the
/// listing always restarts at page 0.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let params = ListingParams {
        page: 0,
        seen: String::new(),
        ..params
    };
    let cart = state.cart().snapshot();

    let categories = state.catalog().categories().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories");
        Vec::new()
    });
    let feed = load_feed(&state, &params, &cart).await;

    HomeTemplate {
        nav: NavView::new(Some(user), &cart),
        params,
        categories,
        feed,
        search_debounce_ms: state.config().listing.search_debounce_ms,
    }
}
