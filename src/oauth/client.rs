//! Calls to provider token and userinfo endpoints

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::oauth::providers::{ProviderConfig, ProviderKind};
use crate::oauth::{OAuthError, OAuthProfile};
use crate::utils::logging::LoggingHelper;

/// The two provider round-trips of an authorization-code sign-in
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Trade the authorization code for an access token
    async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError>;

    /// Fetch and normalise the signed-in user's profile
    async fn fetch_profile(
        &self,
        provider: &ProviderConfig,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// `reqwest` backed client used in production
#[derive(Clone)]
pub struct HttpOAuthClient {
    http_client: reqwest::Client,
}

impl HttpOAuthClient {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised
    pub fn new() -> Result<Self, OAuthError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("home-loan-helper/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| OAuthError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    async fn get_json(&self, url: &str, access_token: &str) -> Result<Value, OAuthError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OAuthError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::Provider(format!(
                "{url} responded with status {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(format!("Invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ];

        LoggingHelper::log_token_exchange_start(&provider.name);
        // GitHub answers form-encoded unless JSON is asked for
        let response = self
            .http_client
            .post(&provider.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Provider(format!(
                "Token exchange failed with status {status}: {error_text}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Provider(format!("Failed to parse token response: {e}")))?;
        parse_token_response(token)
    }

    async fn fetch_profile(
        &self,
        provider: &ProviderConfig,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        let user = self
            .get_json(&provider.userinfo_endpoint, access_token)
            .await?;

        match provider.kind {
            ProviderKind::GitHub => {
                let emails = if user["email"].as_str().is_some() {
                    None
                } else {
                    let url = format!("{}/emails", provider.userinfo_endpoint);
                    // Scope may not grant email access; the profile is still usable without it
                    self.get_json(&url, access_token).await.ok()
                };
                github_profile(&provider.name, &user, emails.as_ref())
            }
            ProviderKind::Google | ProviderKind::Oidc => oidc_profile(&provider.name, &user),
        }
    }
}

fn parse_token_response(token: TokenResponse) -> Result<String, OAuthError> {
    if let Some(error) = token.error {
        let description = token.error_description.unwrap_or_default();
        return Err(OAuthError::Provider(format!("{error}: {description}")));
    }
    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OAuthError::Provider("Token response missing access_token".to_string()))
}

/// Google and other OpenID Connect userinfo documents.
///
/// The email is only kept when the provider vouches for it, since account
/// linking trusts it.
fn oidc_profile(provider: &str, user: &Value) -> Result<OAuthProfile, OAuthError> {
    let subject = user["sub"]
        .as_str()
        .ok_or_else(|| OAuthError::Provider("Userinfo missing sub".to_string()))?;

    // Some providers send the claim as a string
    let email_verified = match &user["email_verified"] {
        Value::Bool(verified) => *verified,
        Value::String(verified) => verified.eq_ignore_ascii_case("true"),
        _ => false,
    };
    let email = user["email"]
        .as_str()
        .filter(|_| email_verified)
        .map(str::to_string);

    Ok(OAuthProfile {
        provider: provider.to_string(),
        provider_account_id: subject.to_string(),
        email,
        name: user["name"].as_str().map(str::to_string),
    })
}

/// GitHub `/user`, falling back to the primary verified address from `/user/emails`
fn github_profile(
    provider: &str,
    user: &Value,
    emails: Option<&Value>,
) -> Result<OAuthProfile, OAuthError> {
    let id = match &user["id"] {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err(OAuthError::Provider("GitHub user missing id".to_string())),
    };

    let email = user["email"].as_str().map(str::to_string).or_else(|| {
        emails?
            .as_array()?
            .iter()
            .find(|e| e["primary"].as_bool() == Some(true) && e["verified"].as_bool() == Some(true))
            .and_then(|e| e["email"].as_str())
            .map(str::to_string)
    });

    Ok(OAuthProfile {
        provider: provider.to_string(),
        provider_account_id: id,
        email,
        name: user["name"]
            .as_str()
            .or_else(|| user["login"].as_str())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_google_profile() {
        let profile = oidc_profile(
            "google",
            &json!({
                "sub": "1098",
                "email": "g@example.com",
                "email_verified": true,
                "name": "Gee"
            }),
        )
        .unwrap();
        assert_eq!(profile.provider_account_id, "1098");
        assert_eq!(profile.email.as_deref(), Some("g@example.com"));
        assert_eq!(profile.name.as_deref(), Some("Gee"));

        assert!(oidc_profile("google", &json!({"email": "x"})).is_err());
    }

    #[test]
    fn test_oidc_profile_drops_unverified_email() {
        for claims in [
            json!({"sub": "x", "email": "test@example.com", "email_verified": false}),
            json!({"sub": "x", "email": "test@example.com"}),
            json!({"sub": "x", "email": "test@example.com", "email_verified": "false"}),
        ] {
            let profile = oidc_profile("google", &claims).unwrap();
            assert_eq!(profile.provider_account_id, "x");
            assert!(profile.email.is_none(), "kept email for {claims}");
        }

        let profile = oidc_profile(
            "corp",
            &json!({"sub": "y", "email": "y@example.com", "email_verified": "true"}),
        )
        .unwrap();
        assert_eq!(profile.email.as_deref(), Some("y@example.com"));
    }

    #[test]
    fn test_github_profile_with_public_email() {
        let profile = github_profile(
            "github",
            &json!({"id": 42, "login": "octo", "name": null, "email": "o@example.com"}),
            None,
        )
        .unwrap();
        assert_eq!(profile.provider_account_id, "42");
        assert_eq!(profile.email.as_deref(), Some("o@example.com"));
        assert_eq!(profile.name.as_deref(), Some("octo"));
    }

    #[test]
    fn test_github_profile_uses_primary_verified_email() {
        let emails = json!([
            {"email": "old@example.com", "primary": false, "verified": true},
            {"email": "unverified@example.com", "primary": true, "verified": false},
            {"email": "main@example.com", "primary": true, "verified": true}
        ]);
        let profile = github_profile(
            "github",
            &json!({"id": 7, "login": "octo", "email": null}),
            Some(&emails),
        )
        .unwrap();
        assert_eq!(profile.email.as_deref(), Some("main@example.com"));
    }

    #[test]
    fn test_github_profile_without_any_email() {
        let profile = github_profile("github", &json!({"id": 7, "login": "octo"}), None).unwrap();
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_token_response_parsing() {
        let ok = TokenResponse {
            access_token: Some("tok".into()),
            error: None,
            error_description: None,
        };
        assert_eq!(parse_token_response(ok).unwrap(), "tok");

        let failed = TokenResponse {
            access_token: None,
            error: Some("bad_verification_code".into()),
            error_description: Some("The code passed is incorrect or expired.".into()),
        };
        let err = parse_token_response(failed).unwrap_err();
        assert!(err.to_string().contains("bad_verification_code"));
    }
}
