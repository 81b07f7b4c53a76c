//! OAuth `state` parameter
//!
//! The state travels through the provider encrypted with the application key.
//! Its CSRF token is also set in a cookie, and both halves must agree on the
//! callback.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::oauth::OAuthError;
use crate::utils::crypto::{generate_csrf_token, EncryptionService};

/// How long a sign-in may take between redirect and callback
pub const STATE_MAX_AGE_MINUTES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthState {
    pub csrf: String,
    pub provider: String,
    pub redirect_url: Option<String>,
    /// Unix seconds
    pub issued_at: i64,
}

impl OAuthState {
    #[must_use]
    pub fn new(provider: &str, redirect_url: Option<String>) -> Self {
        Self {
            csrf: generate_csrf_token(),
            provider: provider.to_string(),
            redirect_url,
            issued_at: Utc::now().timestamp(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn seal(&self, encryption: &EncryptionService) -> Result<String, OAuthError> {
        encryption
            .encrypt_json(self)
            .map_err(|e| OAuthError::InvalidState(format!("Failed to seal state: {e}")))
    }

    /// Decrypt and check a state received on the callback
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be decrypted, was issued for another
    /// provider, does not match the CSRF cookie, or is too old
    pub fn open(
        sealed: &str,
        encryption: &EncryptionService,
        provider: &str,
        csrf_cookie: Option<&str>,
    ) -> Result<Self, OAuthError> {
        let state: Self = encryption
            .decrypt_json(sealed)
            .map_err(|_| OAuthError::InvalidState("State could not be decrypted".to_string()))?;

        if state.provider != provider {
            return Err(OAuthError::InvalidState("Provider mismatch".to_string()));
        }
        if csrf_cookie != Some(state.csrf.as_str()) {
            return Err(OAuthError::InvalidState("CSRF token mismatch".to_string()));
        }
        let age = Utc::now().timestamp() - state.issued_at;
        if age < 0 || age > Duration::minutes(STATE_MAX_AGE_MINUTES).num_seconds() {
            return Err(OAuthError::InvalidState("State expired".to_string()));
        }

        Ok(state)
    }
}
