use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use crate::passkey::PasskeySettings;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub encryption: EncryptionSettings,
    pub passkeys: PasskeySettings,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingSettings,
    pub providers: Vec<ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// `development` or `production`
    pub environment: String,
    /// Origin of the web frontend, used for CORS and post-login redirects
    pub frontend_url: String,
    /// Public base URL of this API, used to build OAuth callback URLs
    pub redirect_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub duration_days: u64,
    /// How often expired sessions and challenges are purged. 0 disables the task.
    pub cleanup_interval_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CookieSettings {
    /// Unset means "secure in production"
    pub secure: Option<bool>,
}

impl CookieSettings {
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EncryptionSettings {
    /// Base64 encoded 32 byte key, or any passphrase (a key is derived from it)
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_seconds: u64,
    /// Key clients by `X-Forwarded-For`/`Forwarded` instead of the socket peer.
    /// Only enable behind a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub scopes: Vec<String>,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub enabled: bool,
    pub extra_auth_params: HashMap<String, String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3001,
            environment: "development".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            redirect_base_url: "http://localhost:3001".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://home_loan_helper.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_days: 30,
            cleanup_interval_minutes: 60,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_seconds: 60,
            trust_proxy: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: None,
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
            scopes: Vec::new(),
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            enabled: true,
            extra_auth_params: HashMap::new(),
        }
    }
}

impl AppSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // .env is optional; a missing file is not an error
        let _ = dotenvy::dotenv();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
        )
        .try_init()?;

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `HOME_LOAN_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("HOME_LOAN_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ HOME_LOAN_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_database_env_overrides(&mut settings.database);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_encryption_env_overrides(&mut settings.encryption);
        Self::apply_passkey_env_overrides(&mut settings.passkeys);
        Self::apply_rate_limit_env_overrides(&mut settings.rate_limit);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_provider_env_defaults(&mut settings.providers);

        // Cookie security follows the environment unless set explicitly
        if settings.cookies.secure.is_none() {
            settings.cookies.secure = Some(settings.is_production());
        }
        Self::apply_cookie_env_overrides(&mut settings.cookies);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(environment) = std::env::var("APP_ENV").or_else(|_| std::env::var("NODE_ENV")) {
            app_settings.environment = environment;
            if app_settings.environment == "production" && std::env::var("HOST").is_err() {
                app_settings.host = "0.0.0.0".to_string();
            }
        }
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(frontend_url) = std::env::var("FRONTEND_URL") {
            app_settings.frontend_url = frontend_url;
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
    }

    fn apply_database_env_overrides(database: &mut DatabaseSettings) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            database.url = url;
        }
        if let Ok(value) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = value.parse::<u32>() {
                database.max_connections = max;
            }
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_numeric_env_override(
            "SESSION_DURATION_DAYS",
            &mut session_settings.duration_days,
        );
        Self::apply_numeric_env_override(
            "SESSION_CLEANUP_INTERVAL_MINUTES",
            &mut session_settings.cleanup_interval_minutes,
        );
    }

    /// Apply the encryption key override, generating a throwaway key when none is configured
    pub fn apply_encryption_env_overrides(encryption: &mut EncryptionSettings) {
        let env_key_set = std::env::var("ENCRYPTION_KEY").is_ok_and(|key| {
            if key.is_empty() {
                false
            } else {
                encryption.key = key;
                true
            }
        });

        if !env_key_set && encryption.key.is_empty() {
            encryption.key = Self::generate_random_encryption_key();
            Self::warn_about_generated_key();
        }
    }

    fn apply_passkey_env_overrides(passkeys: &mut PasskeySettings) {
        if let Ok(rp_id) = std::env::var("WEBAUTHN_RP_ID") {
            passkeys.rp_id = rp_id;
        }
        if let Ok(rp_name) = std::env::var("WEBAUTHN_RP_NAME") {
            passkeys.rp_name = rp_name;
        }
        if let Ok(origin) = std::env::var("WEBAUTHN_ORIGIN") {
            passkeys.rp_origin = origin;
        }
    }

    fn apply_rate_limit_env_overrides(rate_limit: &mut RateLimitSettings) {
        if let Ok(value) = std::env::var("RATE_LIMIT_MAX") {
            if let Ok(max) = value.parse::<u32>() {
                rate_limit.max_requests = max;
            }
        }
        Self::apply_numeric_env_override(
            "RATE_LIMIT_WINDOW_SECONDS",
            &mut rate_limit.window_seconds,
        );
        if let Ok(value) = std::env::var("RATE_LIMIT_ENABLED") {
            if let Ok(enabled) = value.parse::<bool>() {
                rate_limit.enabled = enabled;
            }
        }
        if let Ok(value) = std::env::var("RATE_LIMIT_TRUST_PROXY") {
            if let Ok(trust_proxy) = value.parse::<bool>() {
                rate_limit.trust_proxy = trust_proxy;
            }
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = Some(cookie_secure);
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Register Google and GitHub when their credentials are present in the environment
    /// but no provider block of that name exists in Settings.toml
    fn apply_provider_env_defaults(providers: &mut Vec<ProviderSettings>) {
        for (name, display_name, id_env, secret_env) in [
            ("google", "Google", "GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            ("github", "GitHub", "GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
        ] {
            if providers.iter().any(|p| p.name == name) || std::env::var(id_env).is_err() {
                continue;
            }
            providers.push(ProviderSettings {
                name: name.to_string(),
                display_name: Some(display_name.to_string()),
                client_id_env: Some(id_env.to_string()),
                client_secret_env: Some(secret_env.to_string()),
                ..Default::default()
            });
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    fn generate_random_encryption_key() -> String {
        crate::utils::crypto::generate_encryption_key()
    }

    fn warn_about_generated_key() {
        eprintln!("⚠️  WARNING: Using auto-generated encryption key");
        eprintln!("🔒 For production use, set the ENCRYPTION_KEY environment variable");
        eprintln!("   or configure [encryption] key in Settings.toml");
        eprintln!("💡 Encrypted user data will be unreadable after a restart unless explicitly configured");
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.application.environment == "production"
    }

    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    #[must_use]
    pub fn session_duration(&self) -> chrono::Duration {
        chrono::Duration::days(i64::try_from(self.session.duration_days).unwrap_or(30))
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        if let Some(env_var) = &self.client_id_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_id.clone()
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.client_secret_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_secret.clone()
    }
}
