//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use dummymart_core::UserId;

use crate::catalog::LoginResponse;

/// Session-stored user identity.
///
/// Only the public profile is kept; API tokens are discarded at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Remote user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email, if any.
    pub email: Option<String>,
    /// Given name, if the API returned one.
    pub first_name: Option<String>,
    /// Family name, if the API returned one.
    pub last_name: Option<String>,
    /// Avatar URL, if any.
    pub image: Option<String>,
}

impl CurrentUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// Initials for the avatar fallback.
    #[must_use]
    pub fn initials(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|name| name.chars().next())
            .collect::<String>()
            .to_uppercase()
    }
}

impl From<LoginResponse> for CurrentUser {
    fn from(login: LoginResponse) -> Self {
        Self {
            id: login.id,
            username: login.username,
            email: login.email,
            first_name: login.first_name,
            last_name: login.last_name,
            image: login.image,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
