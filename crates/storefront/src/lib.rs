//! DummyMart Storefront library.
//!
//! Server-rendered shop front for a DummyJSON-compatible product catalog.
//! Kept as a library so the router can be driven from integration tests.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for interactivity
//! - Askama templates for server-side rendering
//! - Product catalog over REST (`reqwest`), cached with `moka`
//! - One shared [`dummymart_core::CartStore`], persisted through
//!   [`storage::FileStore`]
//! - Sign-in state in `tower-sessions`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the storefront router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
