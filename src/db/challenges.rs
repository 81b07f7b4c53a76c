use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{
    models::{Challenge, ChallengeKind},
    now_ms,
};
use crate::error::{AppError, AppResult};

/// Ceremony state is kept for five minutes
pub const CHALLENGE_TTL_MS: i64 = 5 * 60 * 1000;

pub async fn save_challenge(
    pool: &SqlitePool,
    user_id: &str,
    kind: ChallengeKind,
    state: &str,
) -> AppResult<Challenge> {
    let now = now_ms();
    let challenge = Challenge {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        kind: kind.as_str().to_string(),
        state: state.to_string(),
        created_at: now,
        expires_at: now + CHALLENGE_TTL_MS,
    };

    sqlx::query(
        "INSERT INTO webauthn_challenges (id, user_id, kind, state, created_at, expires_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&challenge.id)
    .bind(&challenge.user_id)
    .bind(&challenge.kind)
    .bind(&challenge.state)
    .bind(challenge.created_at)
    .bind(challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(challenge)
}

/// Remove and return the newest challenge of `kind` for the user.
///
/// Every challenge of that kind for the user is deleted, so a ceremony state
/// can be consumed once.
pub async fn take_challenge(
    pool: &SqlitePool,
    user_id: &str,
    kind: ChallengeKind,
) -> AppResult<Challenge> {
    let challenge = sqlx::query_as::<_, Challenge>(
        "SELECT * FROM webauthn_challenges
         WHERE user_id = ? AND kind = ?
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))?;

    sqlx::query("DELETE FROM webauthn_challenges WHERE user_id = ? AND kind = ?")
        .bind(user_id)
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    if challenge.expires_at < now_ms() {
        return Err(AppError::Unauthorized("Challenge expired".to_string()));
    }

    Ok(challenge)
}

pub async fn delete_expired_challenges(pool: &SqlitePool) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM webauthn_challenges WHERE expires_at < ?")
        .bind(now_ms())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::create_user;
    use crate::testing::test_pool;

    #[actix_web::test]
    async fn test_take_returns_latest_and_consumes() {
        let pool = test_pool().await;
        let user = create_user(&pool, None, None, None).await.unwrap();

        save_challenge(&pool, &user.id, ChallengeKind::Registration, "first")
            .await
            .unwrap();
        let mut second = save_challenge(&pool, &user.id, ChallengeKind::Registration, "second")
            .await
            .unwrap();
        second.created_at += 1;
        sqlx::query("UPDATE webauthn_challenges SET created_at = ? WHERE id = ?")
            .bind(second.created_at)
            .bind(&second.id)
            .execute(&pool)
            .await
            .unwrap();

        let taken = take_challenge(&pool, &user.id, ChallengeKind::Registration)
            .await
            .unwrap();
        assert_eq!(taken.state, "second");

        let err = take_challenge(&pool, &user.id, ChallengeKind::Registration)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn test_kinds_are_separate() {
        let pool = test_pool().await;
        let user = create_user(&pool, None, None, None).await.unwrap();
        save_challenge(&pool, &user.id, ChallengeKind::Authentication, "auth")
            .await
            .unwrap();

        let err = take_challenge(&pool, &user.id, ChallengeKind::Registration)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(take_challenge(&pool, &user.id, ChallengeKind::Authentication)
            .await
            .is_ok());
    }

    #[actix_web::test]
    async fn test_expired_challenge_is_unauthorized_and_purged() {
        let pool = test_pool().await;
        let user = create_user(&pool, None, None, None).await.unwrap();
        let challenge = save_challenge(&pool, &user.id, ChallengeKind::Authentication, "old")
            .await
            .unwrap();
        sqlx::query("UPDATE webauthn_challenges SET expires_at = ? WHERE id = ?")
            .bind(now_ms() - 1_000)
            .bind(&challenge.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = take_challenge(&pool, &user.id, ChallengeKind::Authentication)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        save_challenge(&pool, &user.id, ChallengeKind::Registration, "live")
            .await
            .unwrap();
        let expired = save_challenge(&pool, &user.id, ChallengeKind::Authentication, "stale")
            .await
            .unwrap();
        sqlx::query("UPDATE webauthn_challenges SET expires_at = 0 WHERE id = ?")
            .bind(&expired.id)
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(delete_expired_challenges(&pool).await.unwrap(), 1);
    }
}
