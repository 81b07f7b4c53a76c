// Centralized log lines for sign-in flows and background jobs
use log::{debug, info, warn};

use crate::oauth::OAuthError;

pub struct LoggingHelper;

impl LoggingHelper {
    pub fn log_oauth_provider_initialization() {
        info!("🔧 Initializing OAuth providers from configuration...");
    }

    pub fn log_oauth_provider_disabled(provider_name: &str) {
        info!("⏭️  Provider {provider_name} is disabled, skipping");
    }

    pub fn log_oauth_provider_configured(display_name: &str, provider_name: &str) {
        info!("✅ {display_name} OAuth2 configured ({provider_name})");
    }

    pub fn log_oauth_provider_not_configured(provider_name: &str, reason: &OAuthError) {
        warn!("❌ {provider_name} OAuth2 not configured: {reason}");
    }

    pub fn log_oauth_url_built(provider: &str, scopes: &str) {
        debug!("🔍 Built {provider} OAuth URL with scopes: {scopes}");
    }

    pub fn log_token_exchange_start(provider: &str) {
        info!("🔄 Exchanging authorization code for tokens with {provider}");
    }

    /// Log a completed sign-in
    pub fn log_sign_in(method: &str, user_id: &str) {
        info!("👤 User {user_id} signed in via {method}");
    }

    pub fn log_sign_out(user_id: Option<&str>, sessions_removed: u64) {
        match user_id {
            Some(user_id) => {
                info!("👋 User {user_id} signed out ({sessions_removed} session(s) removed)");
            }
            None => debug!("Sign-out without an active session"),
        }
    }

    /// Log the result of a periodic cleanup run
    pub fn log_cleanup(sessions: u64, challenges: u64) {
        if sessions > 0 || challenges > 0 {
            info!("🧹 Removed {sessions} expired session(s) and {challenges} expired challenge(s)");
        } else {
            debug!("🧹 Cleanup found nothing to remove");
        }
    }
}
