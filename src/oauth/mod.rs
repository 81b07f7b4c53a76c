//! OAuth sign-in with Google and GitHub
//!
//! - [`providers`] - provider endpoints and consent URLs
//! - [`state`] - encrypted `state` parameter with cookie-bound CSRF token
//! - [`client`] - token exchange and profile fetch
//!
//! Account linking lives here too: a provider identity maps to exactly one user.

pub mod client;
pub mod providers;
pub mod state;

pub use client::{HttpOAuthClient, OAuthClient};
pub use providers::{OAuthProviders, ProviderConfig, ProviderKind};
pub use state::OAuthState;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{self, models::User};
use crate::error::{AppError, AppResult};

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Provider error: {0}")]
    Provider(String),
}

impl OAuthError {
    /// Short code handed to the frontend error page
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::InvalidState(_) => "invalid_state",
            Self::Http(_) | Self::Provider(_) => "oauth_callback",
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::UnknownProvider(name) => {
                AppError::NotFound(format!("Unknown provider: {name}"))
            }
            OAuthError::InvalidState(message) => AppError::BadRequest(message),
            OAuthError::Configuration(message)
            | OAuthError::Http(message)
            | OAuthError::Provider(message) => AppError::ServiceUnavailable(message),
        }
    }
}

/// Provider profile reduced to what account linking needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: String,
    pub provider_account_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Resolve the local user for a provider identity.
///
/// An existing link wins. Otherwise a user with the same email is linked, and
/// failing that a new user is created and linked.
pub async fn link_or_create_user(pool: &SqlitePool, profile: &OAuthProfile) -> AppResult<User> {
    if let Some(user) =
        db::accounts::find_user_by_account(pool, &profile.provider, &profile.provider_account_id)
            .await?
    {
        return Ok(user);
    }

    let existing = match &profile.email {
        Some(email) => db::users::find_by_email(pool, email).await?,
        None => None,
    };
    let user = match existing {
        Some(user) => {
            log::info!(
                "🔗 Linking {} account to existing user {}",
                profile.provider,
                user.id
            );
            user
        }
        None => {
            db::users::create_user(pool, profile.email.as_deref(), profile.name.as_deref(), None)
                .await?
        }
    };

    db::accounts::link_account(pool, &user.id, &profile.provider, &profile.provider_account_id)
        .await?;
    Ok(user)
}
