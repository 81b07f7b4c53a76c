//! Who-am-I, session listing and sign-out

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{MeResponse, SessionResponse, SuccessResponse, UserProfile};
use crate::session::{AuthenticatedSession, OptionalSession};
use crate::state::AppState;
use crate::utils::cookies::{cleared_session_cookie, cookie_value, SESSION_COOKIE_NAME};
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;

/// `GET /auth/me`; answers 200 either way
pub async fn me(session: OptionalSession) -> HttpResponse {
    let body = match session.into_inner() {
        Some(auth) => MeResponse {
            authenticated: true,
            user: Some(UserProfile::from(&auth.user)),
        },
        None => MeResponse {
            authenticated: false,
            user: None,
        },
    };
    ResponseBuilder::ok().json(&body)
}

/// `GET /auth/session`; the current session or JSON `null`
pub async fn current_session(session: OptionalSession) -> HttpResponse {
    match session.into_inner() {
        Some(auth) => ResponseBuilder::ok().json(&SessionResponse {
            user: UserProfile::from(&auth.user),
            expires_at: auth.session.expires_at,
        }),
        None => ResponseBuilder::ok().json(&Value::Null),
    }
}

/// `POST /auth/signout`
///
/// Succeeds without a session so a stale client can always clear its cookie.
///
/// # Errors
///
/// Propagates database failures
pub async fn sign_out(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: OptionalSession,
) -> AppResult<HttpResponse> {
    match session.into_inner() {
        Some(auth) => {
            state.sessions.delete_session(&auth.session.token).await?;
            LoggingHelper::log_sign_out(Some(&auth.user.id), 1);
        }
        None => {
            if let Some(token) = cookie_value(&req, SESSION_COOKIE_NAME) {
                state.sessions.delete_session(&token).await?;
            }
            LoggingHelper::log_sign_out(None, 0);
        }
    }

    Ok(ResponseBuilder::ok()
        .cookie(cleared_session_cookie(state.settings.cookies.is_secure()))
        .json(&SuccessResponse::ok()))
}

/// `POST /auth/signout-all`; ends every session of the user
///
/// # Errors
///
/// Returns 401 without a valid session
pub async fn sign_out_all(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
) -> AppResult<HttpResponse> {
    let removed = state.sessions.delete_user_sessions(&auth.user.id).await?;
    LoggingHelper::log_sign_out(Some(&auth.user.id), removed);

    Ok(ResponseBuilder::ok()
        .cookie(cleared_session_cookie(state.settings.cookies.is_secure()))
        .json(&SuccessResponse {
            success: true,
            sessions_removed: Some(removed),
        }))
}

/// `GET /auth/sessions`; active sessions, most recently used first
///
/// # Errors
///
/// Returns 401 without a valid session
pub async fn list_sessions(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
) -> AppResult<HttpResponse> {
    let sessions = state.sessions.get_user_sessions(&auth.user.id).await?;
    Ok(ResponseBuilder::ok().json(&json!({
        "currentSessionId": auth.session.id,
        "sessions": sessions,
    })))
}
