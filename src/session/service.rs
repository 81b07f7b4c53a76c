//! Server-side sessions
//!
//! A session is an opaque random token stored in `server_sessions`. Validation
//! deletes the row once it has expired and bumps `last_used` otherwise.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{self, models::ServerSession, now_ms, to_datetime};
use crate::error::AppResult;
use crate::utils::crypto::generate_session_token;

pub const DEFAULT_SESSION_DURATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: String,
    #[serde(skip)]
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl From<ServerSession> for SessionData {
    fn from(session: ServerSession) -> Self {
        Self {
            id: session.id,
            token: session.token,
            user_id: session.user_id,
            expires_at: to_datetime(session.expires_at),
            created_at: to_datetime(session.created_at),
            last_used: to_datetime(session.last_used),
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    pool: SqlitePool,
    duration: Duration,
}

impl SessionService {
    #[must_use]
    pub fn new(pool: SqlitePool, duration: Duration) -> Self {
        Self { pool, duration }
    }

    /// Issue a new session for the user
    pub async fn create_session(&self, user_id: &str) -> AppResult<SessionData> {
        let expires_at = Utc::now() + self.duration;
        self.create_session_with_token(user_id, &generate_session_token(), expires_at)
            .await
    }

    /// Store a session with a caller-chosen token and expiry
    pub async fn create_session_with_token(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<SessionData> {
        let now = now_ms();
        let session = ServerSession {
            id: Uuid::new_v4().to_string(),
            token: token.to_string(),
            user_id: user_id.to_string(),
            expires_at: expires_at.timestamp_millis(),
            created_at: now,
            last_used: now,
        };
        db::sessions::insert_session(&self.pool, &session).await?;
        Ok(session.into())
    }

    /// Look up a token. Expired sessions are removed and reported as absent.
    pub async fn validate_session(&self, token: &str) -> AppResult<Option<SessionData>> {
        let Some(mut session) = db::sessions::find_by_token(&self.pool, token).await? else {
            return Ok(None);
        };

        let now = now_ms();
        if session.is_expired(now) {
            log::debug!("Session {} expired, removing", session.id);
            self.delete_session(token).await?;
            return Ok(None);
        }

        db::sessions::touch(&self.pool, &session.id, now).await?;
        session.last_used = now;
        Ok(Some(session.into()))
    }

    /// Delete one session. Deleting a missing session is not an error.
    pub async fn delete_session(&self, token: &str) -> AppResult<()> {
        db::sessions::delete_by_token(&self.pool, token).await?;
        Ok(())
    }

    pub async fn revoke_session(&self, token: &str) -> AppResult<()> {
        self.delete_session(token).await
    }

    /// Sign the user out everywhere, returning how many sessions were removed
    pub async fn delete_user_sessions(&self, user_id: &str) -> AppResult<u64> {
        db::sessions::delete_by_user(&self.pool, user_id).await
    }

    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        db::sessions::delete_expired(&self.pool).await
    }

    pub async fn get_user_sessions(&self, user_id: &str) -> AppResult<Vec<SessionData>> {
        let sessions = db::sessions::list_active_for_user(&self.pool, user_id).await?;
        Ok(sessions.into_iter().map(SessionData::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::create_user;
    use crate::testing::test_pool;

    async fn service_with_user() -> (SessionService, String) {
        let pool = test_pool().await;
        let user = create_user(&pool, Some("s@example.com"), None, None)
            .await
            .unwrap();
        (
            SessionService::new(pool, Duration::days(DEFAULT_SESSION_DURATION_DAYS)),
            user.id,
        )
    }

    #[actix_web::test]
    async fn test_create_and_validate() {
        let (service, user_id) = service_with_user().await;
        let created = service.create_session(&user_id).await.unwrap();

        assert_eq!(created.token.len(), 43);
        let remaining = created.expires_at - Utc::now();
        assert!(remaining > Duration::days(29));
        assert!(remaining <= Duration::days(30));

        let validated = service
            .validate_session(&created.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(validated.id, created.id);
        assert_eq!(validated.user_id, user_id);
        assert!(validated.last_used >= created.last_used);
    }

    #[actix_web::test]
    async fn test_unknown_token_is_none() {
        let (service, _) = service_with_user().await;
        assert!(service.validate_session("nope").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_expired_session_is_deleted_on_lookup() {
        let (service, user_id) = service_with_user().await;
        let past = Utc::now() - Duration::seconds(1);
        service
            .create_session_with_token(&user_id, "expired-token", past)
            .await
            .unwrap();

        assert!(service
            .validate_session("expired-token")
            .await
            .unwrap()
            .is_none());
        assert!(db::sessions::find_by_token(&service.pool, "expired-token")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn test_delete_missing_session_is_ok() {
        let (service, _) = service_with_user().await;
        service.delete_session("never-existed").await.unwrap();
        service.revoke_session("never-existed").await.unwrap();
    }

    #[actix_web::test]
    async fn test_cleanup_removes_only_expired() {
        let (service, user_id) = service_with_user().await;
        service.create_session(&user_id).await.unwrap();
        for token in ["old-1", "old-2"] {
            service
                .create_session_with_token(&user_id, token, Utc::now() - Duration::hours(1))
                .await
                .unwrap();
        }

        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 2);
        assert_eq!(service.cleanup_expired_sessions().await.unwrap(), 0);
        assert_eq!(service.get_user_sessions(&user_id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_user_sessions_ordered_by_last_used() {
        let (service, user_id) = service_with_user().await;
        let first = service.create_session(&user_id).await.unwrap();
        let second = service.create_session(&user_id).await.unwrap();
        service
            .create_session_with_token(&user_id, "gone", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        db::sessions::touch(&service.pool, &first.id, now_ms() + 5_000)
            .await
            .unwrap();

        let sessions = service.get_user_sessions(&user_id).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, first.id);
        assert_eq!(sessions[1].id, second.id);
    }

    #[actix_web::test]
    async fn test_delete_user_sessions() {
        let (service, user_id) = service_with_user().await;
        let a = service.create_session(&user_id).await.unwrap();
        service.create_session(&user_id).await.unwrap();

        assert_eq!(service.delete_user_sessions(&user_id).await.unwrap(), 2);
        assert!(service.validate_session(&a.token).await.unwrap().is_none());
    }
}
