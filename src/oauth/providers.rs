//! Provider configuration
//!
//! Google and GitHub carry built-in endpoints. Any other provider must spell
//! out its endpoints in Settings.toml and is treated as an OpenID Connect
//! userinfo source.

use std::collections::HashMap;

use crate::oauth::OAuthError;
use crate::settings::{AppSettings, ProviderSettings};
use crate::utils::logging::LoggingHelper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    GitHub,
    Oidc,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub display_name: String,
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub scopes: Vec<String>,
    pub extra_auth_params: HashMap<String, String>,
}

struct ProviderDefaults {
    kind: ProviderKind,
    authorization_endpoint: &'static str,
    token_endpoint: &'static str,
    userinfo_endpoint: &'static str,
    scopes: &'static [&'static str],
}

static GOOGLE: ProviderDefaults = ProviderDefaults {
    kind: ProviderKind::Google,
    authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth",
    token_endpoint: "https://oauth2.googleapis.com/token",
    userinfo_endpoint: "https://openidconnect.googleapis.com/v1/userinfo",
    scopes: &["openid", "email", "profile"],
};

static GITHUB: ProviderDefaults = ProviderDefaults {
    kind: ProviderKind::GitHub,
    authorization_endpoint: "https://github.com/login/oauth/authorize",
    token_endpoint: "https://github.com/login/oauth/access_token",
    userinfo_endpoint: "https://api.github.com/user",
    scopes: &["read:user", "user:email"],
};

impl ProviderConfig {
    /// Resolve a provider block against the built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing, or if a provider without
    /// defaults does not configure all of its endpoints
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, OAuthError> {
        let missing = |what: &str| {
            OAuthError::Configuration(format!("Missing {what} for provider {}", settings.name))
        };

        let client_id = settings.get_client_id().ok_or_else(|| missing("client_id"))?;
        let client_secret = settings
            .get_client_secret()
            .ok_or_else(|| missing("client_secret"))?;

        let defaults = match settings.name.as_str() {
            "google" => Some(&GOOGLE),
            "github" => Some(&GITHUB),
            _ => None,
        };

        let endpoint = |configured: &Option<String>, default: Option<&'static str>, what: &str| {
            configured
                .clone()
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| missing(what))
        };

        let scopes = if settings.scopes.is_empty() {
            defaults
                .map(|d| d.scopes.iter().map(ToString::to_string).collect())
                .unwrap_or_else(|| vec!["openid".into(), "email".into(), "profile".into()])
        } else {
            settings.scopes.clone()
        };

        Ok(Self {
            name: settings.name.clone(),
            display_name: settings
                .display_name
                .clone()
                .unwrap_or_else(|| settings.name.clone()),
            kind: defaults.map_or(ProviderKind::Oidc, |d| d.kind),
            client_id,
            client_secret,
            authorization_endpoint: endpoint(
                &settings.authorization_endpoint,
                defaults.map(|d| d.authorization_endpoint),
                "authorization_endpoint",
            )?,
            token_endpoint: endpoint(
                &settings.token_endpoint,
                defaults.map(|d| d.token_endpoint),
                "token_endpoint",
            )?,
            userinfo_endpoint: endpoint(
                &settings.userinfo_endpoint,
                defaults.map(|d| d.userinfo_endpoint),
                "userinfo_endpoint",
            )?,
            scopes,
            extra_auth_params: settings.extra_auth_params.clone(),
        })
    }

    /// Where the provider sends the user back to
    #[must_use]
    pub fn redirect_uri(&self, redirect_base_url: &str) -> String {
        format!(
            "{}/api/v1/auth/callback/{}",
            redirect_base_url.trim_end_matches('/'),
            self.name
        )
    }

    /// Build the provider consent URL
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a valid URL
    pub fn authorization_url(
        &self,
        redirect_base_url: &str,
        state: &str,
    ) -> Result<String, OAuthError> {
        let mut url = url::Url::parse(&self.authorization_endpoint)
            .map_err(|e| OAuthError::Configuration(format!("Invalid authorization URL: {e}")))?;
        let scopes = self.scopes.join(" ");

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri(redirect_base_url))
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes)
            .append_pair("state", state);
        for (key, value) in &self.extra_auth_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        LoggingHelper::log_oauth_url_built(&self.name, &scopes);
        Ok(url.to_string())
    }
}

/// The providers usable for sign-in, keyed by name
#[derive(Debug, Clone, Default)]
pub struct OAuthProviders {
    providers: HashMap<String, ProviderConfig>,
}

impl OAuthProviders {
    /// Load every enabled, fully configured provider. Misconfigured ones are logged and skipped.
    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Self {
        LoggingHelper::log_oauth_provider_initialization();
        let mut providers = HashMap::new();

        for provider_settings in &settings.providers {
            if !provider_settings.enabled {
                LoggingHelper::log_oauth_provider_disabled(&provider_settings.name);
                continue;
            }
            match ProviderConfig::from_settings(provider_settings) {
                Ok(config) => {
                    LoggingHelper::log_oauth_provider_configured(
                        &config.display_name,
                        &config.name,
                    );
                    providers.insert(config.name.clone(), config);
                }
                Err(e) => {
                    LoggingHelper::log_oauth_provider_not_configured(&provider_settings.name, &e);
                }
            }
        }

        Self { providers }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Provider names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn with_provider(mut self, config: ProviderConfig) -> Self {
        self.providers.insert(config.name.clone(), config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_settings() -> ProviderSettings {
        ProviderSettings {
            name: "github".to_string(),
            client_id: Some("gh-client".to_string()),
            client_secret: Some("gh-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_defaults() {
        let config = ProviderConfig::from_settings(&github_settings()).unwrap();
        assert_eq!(config.kind, ProviderKind::GitHub);
        assert_eq!(config.token_endpoint, "https://github.com/login/oauth/access_token");
        assert_eq!(config.scopes, vec!["read:user", "user:email"]);
        assert_eq!(config.display_name, "github");
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let settings = ProviderSettings {
            client_secret: None,
            ..github_settings()
        };
        assert!(matches!(
            ProviderConfig::from_settings(&settings),
            Err(OAuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_provider_needs_endpoints() {
        let settings = ProviderSettings {
            name: "acme".to_string(),
            ..github_settings()
        };
        assert!(ProviderConfig::from_settings(&settings).is_err());

        let settings = ProviderSettings {
            name: "acme".to_string(),
            authorization_endpoint: Some("https://id.acme.test/authorize".into()),
            token_endpoint: Some("https://id.acme.test/token".into()),
            userinfo_endpoint: Some("https://id.acme.test/userinfo".into()),
            ..github_settings()
        };
        let config = ProviderConfig::from_settings(&settings).unwrap();
        assert_eq!(config.kind, ProviderKind::Oidc);
        assert_eq!(config.scopes, vec!["openid", "email", "profile"]);
    }

    #[test]
    fn test_authorization_url() {
        let config = ProviderConfig::from_settings(&github_settings()).unwrap();
        let url = config
            .authorization_url("http://localhost:3001/", "opaque-state")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert_eq!(params["client_id"], "gh-client");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:3001/api/v1/auth/callback/github"
        );
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "read:user user:email");
        assert_eq!(params["state"], "opaque-state");
    }

    #[test]
    fn test_registry_skips_disabled_and_incomplete() {
        let mut settings = AppSettings::default();
        settings.providers = vec![
            github_settings(),
            ProviderSettings {
                name: "google".to_string(),
                enabled: false,
                client_id: Some("id".into()),
                client_secret: Some("secret".into()),
                ..Default::default()
            },
            ProviderSettings {
                name: "acme".to_string(),
                ..Default::default()
            },
        ];

        let providers = OAuthProviders::from_settings(&settings);
        assert_eq!(providers.names(), vec!["github"]);
        assert!(providers.get("google").is_none());
    }
}
