//! Shared application state handed to handlers as `web::Data<AppState>`

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::db;
use crate::middleware::RateLimiter;
use crate::oauth::{HttpOAuthClient, OAuthClient, OAuthProviders};
use crate::passkey::PasskeyService;
use crate::session::SessionService;
use crate::settings::AppSettings;
use crate::utils::crypto::EncryptionService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings: Arc<AppSettings>,
    pub encryption: EncryptionService,
    pub sessions: SessionService,
    pub passkeys: PasskeyService,
    pub providers: OAuthProviders,
    pub oauth: Arc<dyn OAuthClient>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Open the database and build every service from settings
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, the
    /// encryption key is unusable, or the relying party settings are invalid
    pub async fn new(settings: AppSettings) -> anyhow::Result<Self> {
        let pool = db::connect(&settings.database.url, settings.database.max_connections).await?;
        let oauth: Arc<dyn OAuthClient> = Arc::new(HttpOAuthClient::new()?);
        Self::from_parts(settings, pool, oauth)
    }

    /// Assemble state around an existing pool and OAuth client
    ///
    /// # Errors
    ///
    /// Returns an error if the encryption key or relying party settings are invalid
    pub fn from_parts(
        settings: AppSettings,
        pool: SqlitePool,
        oauth: Arc<dyn OAuthClient>,
    ) -> anyhow::Result<Self> {
        let encryption = EncryptionService::new(&settings.encryption.key)?;
        let sessions = SessionService::new(pool.clone(), settings.session_duration());
        let passkeys = PasskeyService::new(&settings.passkeys, pool.clone(), sessions.clone())?;
        let providers = OAuthProviders::from_settings(&settings);
        let rate_limiter = Arc::new(RateLimiter::new(
            settings.rate_limit.max_requests,
            Duration::from_secs(settings.rate_limit.window_seconds),
        ));

        Ok(Self {
            db: pool,
            settings: Arc::new(settings),
            encryption,
            sessions,
            passkeys,
            providers,
            oauth,
            rate_limiter,
        })
    }
}
