//! Sign-in and sign-out route handlers.
//!
//! Credentials are checked by the catalog API's login endpoint. Only the
//! returned profile is kept, in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::NavView;
use crate::catalog::CatalogError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    pub password: SecretString,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub nav: NavView,
    pub username: String,
    pub error: Option<String>,
}

impl SignInTemplate {
    fn with_error(username: String, error: impl Into<String>) -> Self {
        Self {
            nav: NavView::anonymous(),
            username,
            error: Some(error.into()),
        }
    }
}

/// Display the sign-in page, or go home if already signed in.
pub async fn sign_in_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignInTemplate {
        nav: NavView::anonymous(),
        username: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle sign-in form submission.
#[instrument(skip(state, session, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Response {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.expose_secret().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            SignInTemplate::with_error(username, "Username and password are required"),
        )
            .into_response();
    }

    let login = match state.catalog().login(&username, &form.password).await {
        Ok(login) => login,
        Err(CatalogError::Rejected { message, .. }) => {
            tracing::info!(reason = %message, "Sign-in rejected");
            return (
                StatusCode::UNAUTHORIZED,
                SignInTemplate::with_error(username, format!("Login failed: {message}")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in request failed");
            return (
                StatusCode::BAD_GATEWAY,
                SignInTemplate::with_error(username, "Error logging in. Please try again."),
            )
                .into_response();
        }
    };

    let user = CurrentUser::from(login);
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            SignInTemplate::with_error(username, "Could not start a session. Please try again."),
        )
            .into_response();
    }

    set_sentry_user(&user.id, &user.username);
    tracing::info!(user_id = %user.id, "Signed in");
    Redirect::to("/").into_response()
}

/// Handle sign-out.
pub async fn sign_out(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/sign-in")
}
