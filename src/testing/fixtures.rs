//! Pre-built test objects

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::{self, models::User};
use crate::oauth::providers::ProviderConfig;
use crate::oauth::{OAuthClient, OAuthError, OAuthProfile};
use crate::session::SessionData;
use crate::settings::{AppSettings, ProviderSettings};
use crate::state::AppState;
use crate::utils::crypto::EncryptionService;

use super::constants::{TEST_EMAIL, TEST_ENCRYPTION_KEY, TEST_FRONTEND_URL, TEST_USERNAME};

/// Settings for an isolated in-memory instance with a GitHub provider configured
#[must_use]
pub fn test_settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.database.url = "sqlite::memory:".to_string();
    settings.database.max_connections = 1;
    settings.encryption.key = TEST_ENCRYPTION_KEY.to_string();
    settings.application.frontend_url = TEST_FRONTEND_URL.to_string();
    settings.providers = vec![ProviderSettings {
        name: "github".to_string(),
        display_name: Some("GitHub".to_string()),
        client_id: Some("test-client-id".to_string()),
        client_secret: Some("test-client-secret".to_string()),
        ..Default::default()
    }];
    settings
}

/// Migrated in-memory database on a single connection
///
/// # Panics
///
/// Panics if the database cannot be opened
pub async fn test_pool() -> SqlitePool {
    db::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}

/// # Panics
///
/// Panics if the test key is rejected
#[must_use]
pub fn test_encryption() -> EncryptionService {
    EncryptionService::new(TEST_ENCRYPTION_KEY).expect("test encryption key")
}

/// State built from [`test_settings`] with a [`FakeOAuthClient`]
pub async fn test_app_state() -> AppState {
    test_app_state_with(test_settings(), FakeOAuthClient::default()).await
}

/// # Panics
///
/// Panics if the state cannot be assembled from `settings`
pub async fn test_app_state_with(
    settings: AppSettings,
    oauth: impl OAuthClient + 'static,
) -> AppState {
    let pool = test_pool().await;
    AppState::from_parts(settings, pool, Arc::new(oauth)).expect("test app state")
}

/// A user with an email and a live session
///
/// # Panics
///
/// Panics on database errors
pub async fn seeded_user_with_session(state: &AppState) -> (User, SessionData) {
    let user = db::users::create_user(&state.db, Some(TEST_EMAIL), Some(TEST_USERNAME), None)
        .await
        .expect("seed user");
    let session = state
        .sessions
        .create_session(&user.id)
        .await
        .expect("seed session");
    (user, session)
}

/// OAuth client answering from canned data instead of the network
#[derive(Debug, Clone)]
pub struct FakeOAuthClient {
    pub profile: Option<OAuthProfile>,
    /// Codes the fake provider refuses to exchange
    pub rejected_code: String,
}

impl Default for FakeOAuthClient {
    fn default() -> Self {
        Self {
            profile: None,
            rejected_code: "bad-code".to_string(),
        }
    }
}

impl FakeOAuthClient {
    #[must_use]
    pub fn with_profile(profile: OAuthProfile) -> Self {
        Self {
            profile: Some(profile),
            ..Self::default()
        }
    }
}

#[async_trait]
impl OAuthClient for FakeOAuthClient {
    async fn exchange_code(
        &self,
        _provider: &ProviderConfig,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        if code == self.rejected_code {
            return Err(OAuthError::Provider("bad_verification_code".to_string()));
        }
        Ok(format!("token-for-{code}"))
    }

    async fn fetch_profile(
        &self,
        provider: &ProviderConfig,
        _access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        self.profile
            .clone()
            .map(|mut profile| {
                profile.provider.clone_from(&provider.name);
                profile
            })
            .ok_or_else(|| OAuthError::Provider("No profile configured".to_string()))
    }
}
