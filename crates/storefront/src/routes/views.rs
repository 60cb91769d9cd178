//! Display data shared by several templates.
//!
//! Views are flattened copies of core types with prices already formatted,
//! so templates stay free of arithmetic.

use chrono::DateTime;
use serde_json::{Map, Value};

use dummymart_core::cart::selectors::{cart_count, is_in_cart, order_total};
use dummymart_core::{CartLineItem, CartState, Price, Product};

use crate::models::CurrentUser;

/// Header data: who is signed in and the cart badge.
#[derive(Clone)]
pub struct NavView {
    pub user: Option<CurrentUser>,
    pub cart_count: u64,
}

impl NavView {
    #[must_use]
    pub fn new(user: Option<CurrentUser>, cart: &CartState) -> Self {
        Self {
            user,
            cart_count: cart_count(cart),
        }
    }

    /// Header for pages shown to signed-out visitors.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user: None,
            cart_count: 0,
        }
    }
}

/// Product tile in the listing grid.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub discount_percentage: Option<f64>,
    pub rating: f64,
    pub thumbnail: Option<String>,
    pub in_cart: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, cart: &CartState) -> Self {
        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.unit_price().to_string(),
            discount_percentage: product.discount_percentage,
            rating: product.rating.unwrap_or_default(),
            thumbnail: product.thumbnail.clone(),
            in_cart: is_in_cart(cart, product.id),
        }
    }
}

/// A labelled product attribute on the detail page.
#[derive(Clone)]
pub struct FactView {
    pub label: &'static str,
    pub value: String,
}

/// A customer review on the detail page.
#[derive(Clone)]
pub struct ReviewView {
    pub reviewer: String,
    pub date: String,
    pub rating: f64,
    pub comment: String,
}

/// Full product record for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub discount_percentage: Option<f64>,
    pub rating: f64,
    pub stock: Option<i64>,
    pub images: Vec<String>,
    pub facts: Vec<FactView>,
    pub reviews: Vec<ReviewView>,
    pub in_cart: bool,
}

impl ProductDetailView {
    #[must_use]
    pub fn new(product: &Product, cart: &CartState) -> Self {
        let mut images = product.images.clone();
        if images.is_empty() {
            images.extend(product.thumbnail.iter().cloned());
        }

        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.unit_price().to_string(),
            discount_percentage: product.discount_percentage,
            rating: product.rating.unwrap_or_default(),
            stock: product.stock,
            images,
            facts: product_facts(product),
            reviews: reviews(&product.extra),
            in_cart: is_in_cart(cart, product.id),
        }
    }
}

fn product_facts(product: &Product) -> Vec<FactView> {
    let extra = &product.extra;
    let dimensions = extra.get("dimensions").and_then(Value::as_object).and_then(|d| {
        let width = scalar_text(d.get("width")?)?;
        let height = scalar_text(d.get("height")?)?;
        let depth = scalar_text(d.get("depth")?)?;
        Some(format!("{width} x {height} x {depth} cm"))
    });

    [
        ("Brand", product.brand.clone()),
        ("Category", product.category.clone()),
        ("SKU", extra_text(extra, "sku")),
        ("Weight", extra_text(extra, "weight").map(|w| format!("{w}g"))),
        ("Dimensions", dimensions),
        ("Availability", extra_text(extra, "availabilityStatus")),
        ("Warranty", extra_text(extra, "warrantyInformation")),
        ("Shipping", extra_text(extra, "shippingInformation")),
        ("Return Policy", extra_text(extra, "returnPolicy")),
        ("Min Order", extra_text(extra, "minimumOrderQuantity")),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| FactView { label, value }))
    .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extra_text(extra: &Map<String, Value>, key: &str) -> Option<String> {
    extra.get(key).and_then(scalar_text)
}

fn reviews(extra: &Map<String, Value>) -> Vec<ReviewView> {
    let Some(entries) = extra.get("reviews").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|review| {
            let date = extra_text(review, "date").unwrap_or_default();
            ReviewView {
                reviewer: extra_text(review, "reviewerName").unwrap_or_else(|| "Anonymous".to_string()),
                date: DateTime::parse_from_rfc3339(&date)
                    .map_or(date, |d| d.format("%b %-d, %Y").to_string()),
                rating: review.get("rating").and_then(Value::as_f64).unwrap_or(0.0),
                comment: extra_text(review, "comment").unwrap_or_default(),
            }
        })
        .collect()
}

/// One cart line with formatted prices.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i64,
    pub title: String,
    pub thumbnail: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartLineItem> for CartItemView {
    fn from(item: &CartLineItem) -> Self {
        Self {
            id: item.id().as_i64(),
            title: item.product.title.clone(),
            thumbnail: item.product.thumbnail.clone(),
            quantity: item.quantity,
            price: item.unit_price().to_string(),
            line_total: item.total_price().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub count: u64,
}

impl From<&CartState> for CartView {
    fn from(cart: &CartState) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total: Price::usd(order_total(cart.items())).to_string(),
            count: cart_count(cart),
        }
    }
}
