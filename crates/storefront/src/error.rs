//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. The only failures a handler
//! can surface come from the product catalog. Upstream failures are captured
//! to Sentry before the response is built; clients only ever see a sanitized
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::catalog::CatalogError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog API operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream asked us to slow down.
    #[error("Rate limited")]
    RateLimited,
}

impl AppError {
    /// Fold catalog errors that have a client-facing meaning into their
    /// own variants.
    fn normalize(self) -> Self {
        match self {
            Self::Catalog(CatalogError::NotFound(what)) => Self::NotFound(what),
            Self::Catalog(CatalogError::RateLimited(_)) => Self::RateLimited,
            other => other,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.normalize();

        // Capture upstream failures to Sentry
        if matches!(err, Self::Catalog(_)) {
            let event_id = sentry::capture_error(&err);
            tracing::error!(
                error = %err,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose upstream error details to clients
        let message = match &err {
            Self::Catalog(_) => "Product service unavailable".to_string(),
            Self::RateLimited => "Too many requests, please try again shortly".to_string(),
            Self::NotFound(_) => err.to_string(),
        };

        (err.status(), message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::Status(500))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_catalog_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(CatalogError::NotFound("Product with id '9999' not found".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CatalogError::RateLimited(5).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(CatalogError::Status(503).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_upstream_details_are_not_exposed() {
        let response = AppError::Catalog(CatalogError::InvalidUrl("http://internal:9/x".to_string()))
            .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Product service unavailable");
    }
}
