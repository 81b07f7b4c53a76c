use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{
    models::{OAuthAccount, User},
    now_ms,
};
use crate::error::AppResult;

/// User linked to a provider account, if any
pub async fn find_user_by_account(
    pool: &SqlitePool,
    provider: &str,
    provider_account_id: &str,
) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
         JOIN oauth_accounts a ON a.user_id = u.id
         WHERE a.provider = ? AND a.provider_account_id = ?",
    )
    .bind(provider)
    .bind(provider_account_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn link_account(
    pool: &SqlitePool,
    user_id: &str,
    provider: &str,
    provider_account_id: &str,
) -> AppResult<OAuthAccount> {
    let account = OAuthAccount {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        provider: provider.to_string(),
        provider_account_id: provider_account_id.to_string(),
        created_at: now_ms(),
    };

    sqlx::query(
        "INSERT INTO oauth_accounts (id, user_id, provider, provider_account_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&account.id)
    .bind(&account.user_id)
    .bind(&account.provider)
    .bind(&account.provider_account_id)
    .bind(account.created_at)
    .execute(pool)
    .await?;

    Ok(account)
}
