//! Cart route handlers.
//!
//! Cart operations use HTMX for updates without full page reloads. Every
//! mutation answers with a fragment and an `HX-Trigger: cart-updated`
//! header so the header badge refreshes. Plain form posts (no HTMX) are
//! redirected to the cart page instead.

use std::convert::Infallible;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{
        AppendHeaders, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use tracing::instrument;

use dummymart_core::cart::selectors::cart_count;
use dummymart_core::{CartState, ProductId};

use super::views::{CartView, NavView};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middleware::auth::is_htmx;
use crate::state::AppState;

/// Event name carried by the cart count stream.
pub const CART_COUNT_EVENT: &str = "cart-count";

/// Form data naming one product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Add button fragment shown on product cards (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_button.html")]
pub struct AddButtonTemplate {
    pub product_id: i64,
    pub in_cart: bool,
}

/// Respond to a cart mutation with the refreshed items fragment.
fn items_response(headers: &HeaderMap, cart: &CartState) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

/// Display cart page.
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> impl IntoResponse {
    let cart = state.cart().snapshot();

    CartShowTemplate {
        nav: NavView::new(Some(user), &cart),
        cart: CartView::from(cart.as_ref()),
    }
}

/// Add one unit of a product to the cart.
///
/// The product record is fetched from the catalog so the cart holds a full
/// copy. HTMX callers get the card's button back in its "Go to Cart" state.
#[instrument(skip(state, _user, headers))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let product = state.catalog().get_product(form.product_id).await?;
    state.cart().add_to_cart(&product);
    add_breadcrumb("cart", "Added to cart", &[("product_id", &product.id.to_string())]);

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        AddButtonTemplate {
            product_id: product.id.as_i64(),
            in_cart: true,
        },
    )
        .into_response())
}

/// Buy now: add the product only if it is not already in the cart, then go
/// to the cart.
#[instrument(skip(state, _user))]
pub async fn buy_now(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Form(form): Form<ProductForm>,
) -> Result<Redirect> {
    // Skip the catalog round trip when the line is already there.
    if state.cart().snapshot().get(form.product_id).is_none() {
        let product = state.catalog().get_product(form.product_id).await?;
        state.cart().add_if_absent(&product);
    }

    Ok(Redirect::to("/cart"))
}

/// Add one unit to a cart line (HTMX).
#[instrument(skip(state, _user, headers))]
pub async fn increase(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Response {
    let cart = state.cart().increase_quantity(form.product_id);
    items_response(&headers, &cart)
}

/// Remove one unit from a cart line, dropping it at zero (HTMX).
#[instrument(skip(state, _user, headers))]
pub async fn decrease(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Response {
    let cart = state.cart().decrease_quantity(form.product_id);
    items_response(&headers, &cart)
}

/// Remove a cart line (HTMX).
#[instrument(skip(state, _user, headers))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Response {
    let cart = state.cart().remove_from_cart(form.product_id);
    add_breadcrumb("cart", "Removed from cart", &[("product_id", &form.product_id.to_string())]);
    items_response(&headers, &cart)
}

/// Empty the cart (HTMX).
#[instrument(skip(state, _user, headers))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    headers: HeaderMap,
) -> Response {
    let cart = state.cart().clear_cart();
    items_response(&headers, &cart)
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, _user))]
pub async fn count(State(state): State<AppState>, RequireAuth(_user): RequireAuth) -> impl IntoResponse {
    CartCountTemplate {
        count: cart_count(&state.cart().snapshot()),
    }
}

/// Stream the cart count as server-sent events.
///
/// Sends the current count immediately, then one event per cart change.
/// Changes that land between two polls collapse into one event carrying the
/// latest count.
#[instrument(skip(state, _user))]
pub async fn events(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let receiver = state.cart().subscribe();
    let initial = cart_count(&state.cart().snapshot());

    let updates = stream::unfold(receiver, |mut receiver| async move {
        receiver.changed().await.ok()?;
        let snapshot: Arc<CartState> = Arc::clone(&receiver.borrow_and_update());
        Some((cart_count(&snapshot), receiver))
    });

    let counts = stream::once(async move { initial })
        .chain(updates)
        .map(|count| Ok(Event::default().event(CART_COUNT_EVENT).data(count.to_string())));

    Sse::new(counts).keep_alive(KeepAlive::default())
}
