//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `DUMMYMART_HOST` - Bind address (default: 127.0.0.1)
//! - `DUMMYMART_PORT` - Listen port (default: 3000)
//! - `DUMMYMART_BASE_URL` - Public URL for the storefront (default: `http://localhost:3000`)
//! - `DUMMYMART_DATA_DIR` - Directory for persisted cart data (default: `.dummymart`)
//! - `DUMMYMART_CATALOG_URL` - Product API base URL (default: `https://dummyjson.com`)
//! - `DUMMYMART_PAGE_SIZE` - Products per listing page (default: 12, max 100)
//! - `DUMMYMART_SEARCH_DEBOUNCE_MS` - Search box debounce (default: 800)
//! - `DUMMYMART_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const MAX_PAGE_SIZE: u32 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory holding the persisted cart
    pub data_dir: PathBuf,
    /// Product catalog API configuration
    pub catalog: CatalogConfig,
    /// Product listing behaviour
    pub listing: ListingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Product catalog API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the product API (e.g., `https://dummyjson.com`)
    pub base_url: Url,
    /// How long product pages, products and categories stay cached
    pub cache_ttl: Duration,
}

/// Product listing configuration.
#[derive(Debug, Clone, Copy)]
pub struct ListingConfig {
    /// Products fetched per page
    pub page_size: u32,
    /// Delay before a search box change triggers a fetch
    pub search_debounce_ms: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 12,
            search_debounce_ms: 800,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or("DUMMYMART_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("DUMMYMART_PORT", 3000u16)?;
        let base_url = env.or_default("DUMMYMART_BASE_URL", &format!("http://localhost:{port}"));
        let data_dir = PathBuf::from(env.or_default("DUMMYMART_DATA_DIR", ".dummymart"));

        let catalog = CatalogConfig {
            base_url: parse_catalog_url(
                &env.or_default("DUMMYMART_CATALOG_URL", "https://dummyjson.com"),
            )?,
            cache_ttl: Duration::from_secs(env.parse_or("DUMMYMART_CATALOG_CACHE_TTL_SECS", 300)?),
        };

        let page_size = env.parse_or("DUMMYMART_PAGE_SIZE", ListingConfig::default().page_size)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar(
                "DUMMYMART_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE} (got {page_size})"),
            ));
        }
        let listing = ListingConfig {
            page_size,
            search_debounce_ms: env.parse_or(
                "DUMMYMART_SEARCH_DEBOUNCE_MS",
                ListingConfig::default().search_debounce_ms,
            )?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            catalog,
            listing,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse and check the catalog base URL.
fn parse_catalog_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("DUMMYMART_CATALOG_URL".to_string(), msg);

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("must be a base URL".to_string()));
    }
    Ok(url)
}
