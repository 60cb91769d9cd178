//! Integration test harness for DummyMart.
//!
//! [`TestApp::spawn`] starts a [`FakeCatalog`] and a storefront wired to it,
//! both on ephemeral local ports, and hands back a cookie-aware client.
//!
//! # Fake catalog data
//!
//! Thirty products with ids `1..=30`. Odd ids are lipsticks in the `beauty`
//! category, even ids are apples in `groceries`; prices are `id + 0.99`.
//! The only valid login is `emilys` / `emilyspass`.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;

use dummymart_core::CartStore;
use dummymart_storefront::config::StorefrontConfig;
use dummymart_storefront::state::AppState;
use dummymart_storefront::storage::FileStore;

/// Number of products the fake catalog serves.
pub const PRODUCT_COUNT: i64 = 30;

/// Username accepted by the fake catalog.
pub const USERNAME: &str = "emilys";

/// Password accepted by the fake catalog.
pub const PASSWORD: &str = "emilyspass";

// =============================================================================
// Fake Catalog
// =============================================================================

/// Fake product catalog listening on a local port.
pub struct FakeCatalog {
    pub url: String,
    hits: Arc<CatalogHits>,
}

#[derive(Default)]
struct CatalogHits {
    product_detail: AtomicUsize,
    listing: AtomicUsize,
}

impl FakeCatalog {
    /// Start the fake catalog.
    pub async fn spawn() -> Self {
        let hits = Arc::new(CatalogHits::default());

        let router = Router::new()
            .route("/products", get(list_products))
            .route("/products/search", get(search_products))
            .route("/products/categories", get(categories))
            .route("/products/category/{slug}", get(category_products))
            .route("/products/{id}", get(product))
            .route("/auth/login", post(login))
            .with_state(Arc::clone(&hits));

        let url = serve(router).await;
        Self { url, hits }
    }

    /// How many product detail requests reached the catalog.
    #[must_use]
    pub fn product_detail_hits(&self) -> usize {
        self.hits.product_detail.load(Ordering::SeqCst)
    }

    /// How many listing requests (all, search or category) reached the catalog.
    #[must_use]
    pub fn listing_hits(&self) -> usize {
        self.hits.listing.load(Ordering::SeqCst)
    }
}

/// A catalog product record, in the API's JSON shape.
#[must_use]
pub fn product_json(id: i64) -> Value {
    let (kind, category) = if id % 2 == 1 {
        ("Lipstick", "beauty")
    } else {
        ("Apple", "groceries")
    };

    json!({
        "id": id,
        "title": format!("{kind} {id:02}"),
        "description": format!("A fine {} for testing.", kind.to_lowercase()),
        "category": category,
        "price": format!("{id}.99").parse::<f64>().unwrap_or_default(),
        "discountPercentage": 10.5,
        "rating": 4.2,
        "stock": 50,
        "brand": "TestCo",
        "sku": format!("SKU-{id:03}"),
        "thumbnail": format!("https://cdn.example.com/{id}/thumbnail.webp"),
        "images": [format!("https://cdn.example.com/{id}/1.webp")],
        "tags": [category],
    })
}

fn all_products() -> Vec<Value> {
    (1..=PRODUCT_COUNT).map(product_json).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    q: Option<String>,
    limit: Option<usize>,
    skip: Option<usize>,
    sort_by: Option<String>,
    order: Option<String>,
}

fn title_of(product: &Value) -> String {
    product["title"].as_str().unwrap_or_default().to_string()
}

fn page(mut products: Vec<Value>, params: &ListParams) -> Json<Value> {
    if params.sort_by.as_deref() == Some("title") {
        products.sort_by_key(title_of);
        if params.order.as_deref() == Some("desc") {
            products.reverse();
        }
    }

    let total = products.len();
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(30);
    let products: Vec<Value> = products.into_iter().skip(skip).take(limit).collect();

    Json(json!({
        "products": products,
        "total": total,
        "skip": skip,
        "limit": limit,
    }))
}

async fn list_products(
    State(hits): State<Arc<CatalogHits>>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    hits.listing.fetch_add(1, Ordering::SeqCst);
    page(all_products(), &params)
}

async fn search_products(
    State(hits): State<Arc<CatalogHits>>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    hits.listing.fetch_add(1, Ordering::SeqCst);
    let needle = params.q.clone().unwrap_or_default().to_lowercase();
    let matches = all_products()
        .into_iter()
        .filter(|p| title_of(p).to_lowercase().contains(&needle))
        .collect();
    page(matches, &params)
}

async fn category_products(
    State(hits): State<Arc<CatalogHits>>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    hits.listing.fetch_add(1, Ordering::SeqCst);
    let matches = all_products()
        .into_iter()
        .filter(|p| p["category"] == slug.as_str())
        .collect();
    page(matches, &params)
}

async fn categories() -> Json<Value> {
    Json(json!([
        {"slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty"},
        {"slug": "groceries", "name": "Groceries", "url": "https://dummyjson.com/products/category/groceries"},
    ]))
}

async fn product(State(hits): State<Arc<CatalogHits>>, Path(id): Path<String>) -> Response {
    hits.product_detail.fetch_add(1, Ordering::SeqCst);
    match id.parse::<i64>() {
        Ok(id) if (1..=PRODUCT_COUNT).contains(&id) => Json(product_json(id)).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Product with id '{id}' not found")})),
        )
            .into_response(),
    }
}

async fn login(Json(body): Json<HashMap<String, String>>) -> Response {
    let username = body.get("username").map(String::as_str);
    let password = body.get("password").map(String::as_str);

    if username == Some(USERNAME) && password == Some(PASSWORD) {
        Json(json!({
            "id": 1,
            "username": USERNAME,
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "gender": "female",
            "image": "https://dummyjson.com/icon/emilys/128",
            "accessToken": "access-token",
            "refreshToken": "refresh-token",
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    format!("http://{addr}")
}

// =============================================================================
// Storefront
// =============================================================================

/// A running storefront backed by a [`FakeCatalog`].
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub catalog: FakeCatalog,
    pub cart: CartStore,
    pub store: FileStore,
    pub data_dir: TempDir,
}

impl TestApp {
    /// Start a storefront with an empty cart.
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        Self::spawn_in(data_dir).await
    }

    /// Start a storefront whose cart lives in `data_dir`.
    pub async fn spawn_in(data_dir: TempDir) -> Self {
        let catalog = FakeCatalog::spawn().await;

        let vars: HashMap<&str, String> = HashMap::from([
            ("DUMMYMART_CATALOG_URL", catalog.url.clone()),
            (
                "DUMMYMART_DATA_DIR",
                data_dir.path().to_string_lossy().into_owned(),
            ),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Failed to build test config");

        let store = FileStore::open(&config.data_dir).expect("Failed to open file store");
        let cart = CartStore::open(Arc::new(store.clone()));
        let app = dummymart_storefront::app(AppState::new(config, cart.clone()));
        let base_url = serve(app).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            catalog,
            cart,
            store,
            data_dir,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign in with the fake catalog's valid credentials.
    pub async fn sign_in(&self) -> reqwest::Response {
        self.client
            .post(self.url("/sign-in"))
            .form(&[("username", USERNAME), ("password", PASSWORD)])
            .send()
            .await
            .expect("Sign-in request failed")
    }

    /// Plain GET.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET as HTMX would issue it.
    pub async fn htmx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("HTMX GET request failed")
    }

    /// Form POST as HTMX would issue it.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("HTMX POST request failed")
    }

    /// Plain form POST.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Response body as text.
    pub async fn text(response: reqwest::Response) -> String {
        response.text().await.expect("Failed to read body")
    }
}
