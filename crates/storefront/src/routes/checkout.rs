//! Checkout route handlers.
//!
//! No payment is processed. Placing an order confirms the current cart
//! contents and empties the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::views::{CartView, NavView};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CheckoutForm, PaymentMethod, PlacedOrder};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub nav: NavView,
    pub cart: CartView,
    pub methods: [PaymentMethod; 3],
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/placed.html")]
pub struct OrderPlacedTemplate {
    pub nav: NavView,
    pub order: PlacedOrder,
}

/// Display the checkout form and order summary.
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> impl IntoResponse {
    let cart = state.cart().snapshot();

    CheckoutTemplate {
        nav: NavView::new(Some(user), &cart),
        cart: CartView::from(cart.as_ref()),
        methods: PaymentMethod::ALL,
    }
}

/// Place the order.
///
/// The order is confirmed from exactly the lines taken out of the cart, so
/// an item added while the order is being placed stays in the cart. An
/// empty cart sends the shopper back to the cart page.
#[instrument(skip(state, user, form))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let taken = state.cart().take_cart();
    let Some(order) = PlacedOrder::confirm(&taken, &form) else {
        return Redirect::to("/cart").into_response();
    };

    let cart = state.cart().snapshot();
    tracing::info!(
        order_number = %order.number,
        units = order.units,
        payment = order.payment.value(),
        total = %order.total,
        "Order placed"
    );
    add_breadcrumb("checkout", "Order placed", &[("order_number", &order.number.to_string())]);

    OrderPlacedTemplate {
        nav: NavView::new(Some(user), &cart),
        order,
    }
    .into_response()
}
