use sqlx::SqlitePool;

use crate::db::{models::User, now_ms};
use crate::error::{AppError, AppResult};

pub async fn create_user(
    pool: &SqlitePool,
    email: Option<&str>,
    username: Option<&str>,
    encrypted_data: Option<&str>,
) -> AppResult<User> {
    let mut user = User::new(email.map(str::to_string), username.map(str::to_string));
    user.encrypted_data = encrypted_data.map(str::to_string);

    sqlx::query(
        "INSERT INTO users (id, email, username, encrypted_data, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.encrypted_data)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Like [`find_by_id`] but a missing user is an error
pub async fn get_by_id(pool: &SqlitePool, user_id: &str) -> AppResult<User> {
    find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Replace the encrypted preferences blob. `None` clears it.
pub async fn update_encrypted_data(
    pool: &SqlitePool,
    user_id: &str,
    encrypted_data: Option<&str>,
) -> AppResult<()> {
    let result = sqlx::query("UPDATE users SET encrypted_data = ?, updated_at = ? WHERE id = ?")
        .bind(encrypted_data)
        .bind(now_ms())
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}
