//! Domain models for the storefront.

pub mod checkout;
pub mod session;

pub use checkout::{CheckoutForm, PaymentMethod, PlacedOrder};
pub use session::{CurrentUser, keys as session_keys};
