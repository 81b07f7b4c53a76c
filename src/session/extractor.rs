//! Request extractors that resolve the `sessionToken` cookie

use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};

use crate::db::{self, models::User};
use crate::error::AppError;
use crate::session::SessionData;
use crate::state::AppState;
use crate::utils::cookies::{cookie_value, SESSION_COOKIE_NAME};

/// A request that must carry a valid session
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session: SessionData,
    pub user: User,
}

/// A request that may carry a valid session
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<AuthenticatedSession>);

impl OptionalSession {
    #[must_use]
    pub fn into_inner(self) -> Option<AuthenticatedSession> {
        self.0
    }
}

async fn resolve(
    state: web::Data<AppState>,
    token: String,
) -> Result<Option<AuthenticatedSession>, AppError> {
    let Some(session) = state.sessions.validate_session(&token).await? else {
        return Ok(None);
    };
    let Some(user) = db::users::find_by_id(&state.db, &session.user_id).await? else {
        return Ok(None);
    };
    Ok(Some(AuthenticatedSession { session, user }))
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))
}

impl FromRequest for AuthenticatedSession {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = cookie_value(req, SESSION_COOKIE_NAME);
        let state = app_state(req);

        Box::pin(async move {
            let token = token
                .ok_or_else(|| AppError::Unauthorized("No session token provided".to_string()))?;
            resolve(state?, token)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid or expired session".to_string()))
        })
    }
}

impl FromRequest for OptionalSession {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = cookie_value(req, SESSION_COOKIE_NAME);
        let state = app_state(req);

        Box::pin(async move {
            let (Some(token), Ok(state)) = (token, state) else {
                return Ok(Self(None));
            };
            match resolve(state, token).await {
                Ok(session) => Ok(Self(session)),
                Err(err) => {
                    log::error!("Optional session lookup failed: {err}");
                    Ok(Self(None))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_user_with_session, test_app_state};
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_missing_cookie_is_rejected() {
        let state = test_app_state().await;
        let req = TestRequest::default()
            .app_data(web::Data::new(state))
            .to_http_request();

        let err = AuthenticatedSession::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "No session token provided"));
    }

    #[actix_web::test]
    async fn test_invalid_token_is_rejected() {
        let state = test_app_state().await;
        let req = TestRequest::default()
            .app_data(web::Data::new(state))
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "bogus"))
            .to_http_request();

        let err = AuthenticatedSession::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid or expired session"));
        assert!(OptionalSession::extract(&req).await.unwrap().0.is_none());
    }

    #[actix_web::test]
    async fn test_valid_session_resolves_user() {
        let state = test_app_state().await;
        let (user, session) = seeded_user_with_session(&state).await;
        let req = TestRequest::default()
            .app_data(web::Data::new(state))
            .cookie(Cookie::new(SESSION_COOKIE_NAME, session.token.clone()))
            .to_http_request();

        let auth = AuthenticatedSession::extract(&req).await.unwrap();
        assert_eq!(auth.user.id, user.id);
        assert_eq!(auth.session.id, session.id);

        let optional = OptionalSession::extract(&req).await.unwrap().into_inner();
        assert_eq!(optional.unwrap().user.id, user.id);
    }
}
