//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing (requires sign-in)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/feed          - Next listing page (HTMX fragment)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (requires sign-in)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit (returns add button fragment)
//! POST /cart/buy-now           - Add if absent, then redirect to /cart
//! POST /cart/increase          - Add one unit to a line (returns cart_items fragment)
//! POST /cart/decrease          - Remove one unit from a line (returns cart_items fragment)
//! POST /cart/remove            - Remove a line (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/events            - Cart count stream (SSE)
//!
//! # Checkout (requires sign-in)
//! GET  /checkout               - Shipping, payment and order summary
//! POST /checkout               - Place the order
//!
//! # Auth
//! GET  /sign-in                - Sign-in page
//! POST /sign-in                - Sign-in action
//! POST /sign-out               - Sign-out action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(products::feed))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/buy-now", post(cart::buy_now))
        .route("/increase", post(cart::increase))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::place))
        // Auth routes
        .route("/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
}
