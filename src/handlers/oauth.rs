//! OAuth sign-in redirect and callback

use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info, warn};

use crate::db::models::User;
use crate::error::AppResult;
use crate::models::{OAuthCallbackQuery, SignInQuery};
use crate::oauth::{link_or_create_user, OAuthError, OAuthState, ProviderConfig};
use crate::state::AppState;
use crate::utils::cookies::{
    cleared_oauth_csrf_cookie, cookie_value, oauth_csrf_cookie, session_cookie,
    OAUTH_CSRF_COOKIE_NAME,
};
use crate::utils::logging::LoggingHelper;
use crate::utils::redirects::{frontend_error_redirect, frontend_redirect, sanitize_callback_url};
use crate::utils::responses::ResponseBuilder;

/// `GET /auth/signin/{provider}`; redirects to the provider consent page
///
/// # Errors
///
/// Returns 404 for a provider that is not configured
pub async fn sign_in(
    state: web::Data<AppState>,
    provider: web::Path<String>,
    query: web::Query<SignInQuery>,
) -> AppResult<HttpResponse> {
    let provider = provider.into_inner();
    let config = state
        .providers
        .get(&provider)
        .ok_or_else(|| OAuthError::UnknownProvider(provider.clone()))?;

    let frontend_url = &state.settings.application.frontend_url;
    let redirect_url = query
        .callback_url
        .as_deref()
        .and_then(|url| sanitize_callback_url(url, frontend_url));

    let oauth_state = OAuthState::new(&config.name, redirect_url);
    let sealed = oauth_state.seal(&state.encryption)?;
    let auth_url =
        config.authorization_url(&state.settings.application.redirect_base_url, &sealed)?;

    info!("Redirecting to {} for sign-in", config.display_name);
    Ok(ResponseBuilder::redirect_with_cookies(
        &auth_url,
        vec![oauth_csrf_cookie(
            &oauth_state.csrf,
            state.settings.cookies.is_secure(),
        )],
    ))
}

/// `GET /auth/callback/{provider}`
///
/// Always answers with a redirect to the frontend: the requested page on
/// success, the error page with a short code otherwise.
pub async fn callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    provider: web::Path<String>,
    query: web::Query<OAuthCallbackQuery>,
) -> HttpResponse {
    let settings = &state.settings;
    let secure = settings.cookies.is_secure();
    let csrf_cookie = cookie_value(&req, OAUTH_CSRF_COOKIE_NAME);

    match complete_sign_in(&state, &provider, &query, csrf_cookie.as_deref()).await {
        Ok((user, token, redirect_url)) => {
            LoggingHelper::log_sign_in(&provider, &user.id);
            ResponseBuilder::redirect_with_cookies(
                &frontend_redirect(&settings.application.frontend_url, redirect_url.as_deref()),
                vec![
                    session_cookie(&token, secure, settings.session.duration_days),
                    cleared_oauth_csrf_cookie(secure),
                ],
            )
        }
        Err(e) => {
            let code = e.code();
            warn!("❌ {provider} sign-in failed: {e}");
            ResponseBuilder::redirect_with_cookies(
                &frontend_error_redirect(&settings.application.frontend_url, code),
                vec![cleared_oauth_csrf_cookie(secure)],
            )
        }
    }
}

/// Failure modes of the callback, each with the code shown by the frontend
#[derive(Debug, thiserror::Error)]
enum CallbackError {
    #[error("provider returned error: {0}")]
    Denied(String),
    #[error(transparent)]
    OAuth(#[from] OAuthError),
    #[error("{0}")]
    Account(#[from] crate::error::AppError),
}

impl CallbackError {
    fn code(&self) -> &'static str {
        match self {
            Self::Denied(error) if error == "access_denied" => "access_denied",
            Self::Denied(_) | Self::Account(_) => "oauth_callback",
            Self::OAuth(e) => e.code(),
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    provider: &str,
    query: &OAuthCallbackQuery,
    csrf_cookie: Option<&str>,
) -> Result<(User, String, Option<String>), CallbackError> {
    if let Some(error) = &query.error {
        if let Some(description) = &query.error_description {
            warn!("{provider} returned {error}: {description}");
        }
        return Err(CallbackError::Denied(error.clone()));
    }

    let config: &ProviderConfig = state
        .providers
        .get(provider)
        .ok_or_else(|| OAuthError::UnknownProvider(provider.to_string()))?;

    let sealed = query
        .state
        .as_deref()
        .ok_or_else(|| OAuthError::InvalidState("Missing state parameter".to_string()))?;
    let oauth_state = OAuthState::open(sealed, &state.encryption, &config.name, csrf_cookie)?;

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OAuthError::Provider("Missing authorization code".to_string()))?;

    let redirect_uri = config.redirect_uri(&state.settings.application.redirect_base_url);
    let access_token = state.oauth.exchange_code(config, code, &redirect_uri).await?;
    let profile = state.oauth.fetch_profile(config, &access_token).await?;

    let user = link_or_create_user(&state.db, &profile).await.inspect_err(|e| {
        error!("Failed to resolve account for {provider}: {e}");
    })?;
    let session = state.sessions.create_session(&user.id).await?;

    Ok((user, session.token, oauth_state.redirect_url))
}
