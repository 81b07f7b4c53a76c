//! Passkey ceremony endpoints

use actix_web::{web, HttpResponse};
use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    BeginRegistrationRequest, CeremonyStartResponse, FinishRequest, LoginBeginRequest,
    PasskeyInfo, PasskeysResponse, SuccessResponse, VerifiedResponse,
};
use crate::passkey::VerifiedPasskey;
use crate::session::{AuthenticatedSession, OptionalSession};
use crate::state::AppState;
use crate::utils::cookies::session_cookie;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;

/// `POST /auth/register/begin`
///
/// The body is optional: an empty body registers an anonymous user, or adds a
/// passkey to the signed-in user's account.
///
/// # Errors
///
/// Returns 400 for malformed JSON, 409 when the email belongs to an account
/// the caller is not signed in to, and propagates database or `WebAuthn` failures
pub async fn register_begin(
    state: web::Data<AppState>,
    session: OptionalSession,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let request: BeginRegistrationRequest = if body.iter().all(u8::is_ascii_whitespace) {
        BeginRegistrationRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let start = state
        .passkeys
        .begin_registration(
            request.email.as_deref(),
            request.username.as_deref(),
            session.into_inner().map(|s| s.user.id).as_deref(),
        )
        .await?;

    Ok(ResponseBuilder::ok().json(&CeremonyStartResponse {
        options: start.options,
        user_id: start.user_id,
    }))
}

/// `POST /auth/register/finish`
///
/// # Errors
///
/// Returns an error when the challenge is missing or expired, or the
/// attestation does not verify
pub async fn register_finish(
    state: web::Data<AppState>,
    body: web::Json<FinishRequest>,
) -> AppResult<HttpResponse> {
    let FinishRequest {
        user_id,
        credential,
        name,
    } = body.into_inner();
    let verified = state
        .passkeys
        .finish_registration(&user_id, &credential, name.as_deref())
        .await?;

    LoggingHelper::log_sign_in("passkey registration", &verified.user.id);
    Ok(verified_response(&state, &verified))
}

/// `POST /auth/login/begin`
///
/// # Errors
///
/// Returns 400 without an email and 404 when the user or their passkeys are unknown
pub async fn login_begin(
    state: web::Data<AppState>,
    body: web::Json<LoginBeginRequest>,
) -> AppResult<HttpResponse> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let start = state.passkeys.begin_authentication(email).await?;
    info!("🔐 Passkey sign-in started for user {}", start.user_id);

    Ok(ResponseBuilder::ok().json(&CeremonyStartResponse {
        options: start.options,
        user_id: start.user_id,
    }))
}

/// `POST /auth/login/finish`
///
/// # Errors
///
/// Returns an error when the passkey is unknown, the assertion does not verify,
/// or the authenticator counter went backwards
pub async fn login_finish(
    state: web::Data<AppState>,
    body: web::Json<FinishRequest>,
) -> AppResult<HttpResponse> {
    let FinishRequest {
        user_id, credential, ..
    } = body.into_inner();
    let verified = state
        .passkeys
        .finish_authentication(&user_id, &credential)
        .await?;

    LoggingHelper::log_sign_in("passkey", &verified.user.id);
    Ok(verified_response(&state, &verified))
}

/// `GET /auth/passkeys`; the caller's passkeys, newest first
///
/// # Errors
///
/// Returns 401 without a session
pub async fn list_passkeys(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
) -> AppResult<HttpResponse> {
    let records = state.passkeys.list_passkeys(&auth.user.id).await?;
    Ok(ResponseBuilder::ok().json(&PasskeysResponse {
        passkeys: records.iter().map(PasskeyInfo::from).collect(),
    }))
}

/// `DELETE /auth/passkeys/{id}`
///
/// # Errors
///
/// Returns 401 without a session and 404 for a passkey the caller does not own
pub async fn delete_passkey(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
    passkey_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    state
        .passkeys
        .delete_passkey(&auth.user.id, &passkey_id)
        .await?;
    Ok(ResponseBuilder::ok().json(&SuccessResponse::ok()))
}

fn verified_response(state: &AppState, verified: &VerifiedPasskey) -> HttpResponse {
    let settings = &state.settings;
    ResponseBuilder::ok()
        .cookie(session_cookie(
            &verified.session.token,
            settings.cookies.is_secure(),
            settings.session.duration_days,
        ))
        .json(&VerifiedResponse {
            verified: true,
            session_token: verified.session.token.clone(),
        })
}
