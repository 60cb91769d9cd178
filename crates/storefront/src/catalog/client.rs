//! Product catalog API client implementation.
//!
//! Plain JSON over `reqwest`. Product pages, single products and the
//! category list are cached with `moka`; search results and logins are not.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use dummymart_core::{Product, ProductId};

use super::CatalogError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    ApiMessage, Category, LoginResponse, ProductPage, ProductQuery, ProductSource,
};
use crate::config::CatalogConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("dummymart/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        }
    }

    /// Build an endpoint URL below the configured base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build the listing URL for a page request.
    pub(crate) fn products_url(&self, query: &ProductQuery) -> Result<Url, CatalogError> {
        let mut url = match &query.source {
            ProductSource::All => self.endpoint(&["products"])?,
            ProductSource::Search(_) => self.endpoint(&["products", "search"])?,
            ProductSource::Category(slug) => self.endpoint(&["products", "category", slug])?,
        };

        {
            let mut pairs = url.query_pairs_mut();
            if let ProductSource::Search(q) = &query.source {
                pairs.append_pair("q", q);
            }
            pairs
                .append_pair("limit", &query.limit.to_string())
                .append_pair("skip", &query.skip.to_string());
            if let Some(order) = query.sort.as_param() {
                pairs.append_pair("sortBy", "title").append_pair("order", order);
            }
        }

        Ok(url)
    }

    /// Turn a response into its body, mapping failure statuses to errors.
    async fn read_body(response: reqwest::Response) -> Result<String, CatalogError> {
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::NOT_FOUND {
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map_or_else(|_| "resource not found".to_string(), |m| m.message);
            return Err(CatalogError::NotFound(message));
        }

        if status.is_client_error()
            && let Ok(api) = serde_json::from_str::<ApiMessage>(&body)
        {
            return Err(CatalogError::Rejected {
                status: status.as_u16(),
                message: api.message,
            });
        }

        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Catalog API returned non-success status"
        );
        Err(CatalogError::Status(status.as_u16()))
    }

    /// Parse a JSON body, logging the payload on failure.
    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, CatalogError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let response = self.inner.client.get(url).send().await?;
        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let cacheable = !matches!(query.source, ProductSource::Search(_));
        let cache_key = CacheKey::Page(query.clone());

        // Check cache (search results are never cached)
        if cacheable
            && let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page: ProductPage = self.get_json(self.products_url(query)?).await?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Page(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown products, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id);

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", &id.to_string()])?;
        let product: Product = self.get_json(url).await?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get every product category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .get_json(self.endpoint(&["products", "categories"])?)
            .await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange a username and password for the remote user record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Rejected`] with the API's message for bad
    /// credentials, or another error if the API request fails.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, CatalogError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(&["auth", "login"])?)
            .json(&serde_json::json!({
                "username": username,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;

        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }
}
