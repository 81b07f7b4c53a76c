use sqlx::SqlitePool;

use crate::db::{models::ServerSession, now_ms};
use crate::error::AppResult;

pub async fn insert_session(pool: &SqlitePool, session: &ServerSession) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO server_sessions (id, token, user_id, expires_at, created_at, last_used)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.token)
    .bind(&session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .bind(session.last_used)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> AppResult<Option<ServerSession>> {
    let session =
        sqlx::query_as::<_, ServerSession>("SELECT * FROM server_sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;
    Ok(session)
}

/// Set `last_used`
pub async fn touch(pool: &SqlitePool, session_id: &str, at: i64) -> AppResult<()> {
    sqlx::query("UPDATE server_sessions SET last_used = ? WHERE id = ?")
        .bind(at)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_by_token(pool: &SqlitePool, token: &str) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM server_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_user(pool: &SqlitePool, user_id: &str) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM server_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired(pool: &SqlitePool) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM server_sessions WHERE expires_at < ?")
        .bind(now_ms())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Unexpired sessions of a user, most recently used first
pub async fn list_active_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Vec<ServerSession>> {
    let sessions = sqlx::query_as::<_, ServerSession>(
        "SELECT * FROM server_sessions
         WHERE user_id = ? AND expires_at > ?
         ORDER BY last_used DESC",
    )
    .bind(user_id)
    .bind(now_ms())
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}
