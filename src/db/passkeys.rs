use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{models::PasskeyRecord, now_ms};
use crate::error::{AppError, AppResult};

/// Columns of a freshly registered passkey
pub struct NewPasskey<'a> {
    pub user_id: &'a str,
    pub credential_id: &'a str,
    pub credential_json: &'a str,
    pub name: Option<&'a str>,
    pub device_type: &'a str,
    pub backed_up: bool,
    pub transports: &'a [String],
}

pub async fn save_passkey(pool: &SqlitePool, passkey: &NewPasskey<'_>) -> AppResult<PasskeyRecord> {
    let transports = serde_json::to_string(passkey.transports)?;
    let record = PasskeyRecord {
        id: Uuid::new_v4().to_string(),
        user_id: passkey.user_id.to_string(),
        credential_id: passkey.credential_id.to_string(),
        credential: passkey.credential_json.to_string(),
        name: passkey.name.map(str::to_string),
        counter: 0,
        device_type: passkey.device_type.to_string(),
        backed_up: passkey.backed_up,
        transports,
        created_at: now_ms(),
        last_used_at: None,
    };

    sqlx::query(
        "INSERT INTO passkeys
         (id, user_id, credential_id, credential, name, counter, device_type, backed_up, transports, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.credential_id)
    .bind(&record.credential)
    .bind(&record.name)
    .bind(record.counter)
    .bind(&record.device_type)
    .bind(record.backed_up)
    .bind(&record.transports)
    .bind(record.created_at)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::BadRequest("Passkey already registered".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(record)
}

pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<PasskeyRecord>> {
    let passkeys = sqlx::query_as::<_, PasskeyRecord>(
        "SELECT * FROM passkeys WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(passkeys)
}

pub async fn find_by_credential_id(
    pool: &SqlitePool,
    credential_id: &str,
) -> AppResult<Option<PasskeyRecord>> {
    let passkey =
        sqlx::query_as::<_, PasskeyRecord>("SELECT * FROM passkeys WHERE credential_id = ?")
            .bind(credential_id)
            .fetch_optional(pool)
            .await?;
    Ok(passkey)
}

/// Delete one of the user's passkeys. Returns `false` when no passkey with
/// that id belongs to the user.
pub async fn delete_for_user(
    pool: &SqlitePool,
    user_id: &str,
    passkey_id: &str,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM passkeys WHERE id = ? AND user_id = ?")
        .bind(passkey_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store the new signature counter and refreshed credential.
///
/// The write only happens when the stored counter is not ahead of the new one.
/// No affected row means the authenticator went backwards, which is treated
/// as a cloned credential.
pub async fn update_counter(
    pool: &SqlitePool,
    credential_id: &str,
    new_counter: u32,
    credential_json: &str,
) -> AppResult<()> {
    let new_counter = i64::from(new_counter);
    let result = sqlx::query(
        "UPDATE passkeys
         SET counter = ?, credential = ?, last_used_at = ?
         WHERE credential_id = ? AND counter <= ?",
    )
    .bind(new_counter)
    .bind(credential_json)
    .bind(now_ms())
    .bind(credential_id)
    .bind(new_counter)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        log::warn!("🚨 Signature counter regression for credential {credential_id}");
        return Err(AppError::Unauthorized(
            "Authenticator counter regression detected".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::create_user;
    use crate::testing::test_pool;

    async fn seeded(pool: &SqlitePool) -> PasskeyRecord {
        let user = create_user(pool, Some("pk@example.com"), None, None)
            .await
            .unwrap();
        save_passkey(
            pool,
            &NewPasskey {
                user_id: &user.id,
                credential_id: "cred-abc",
                credential_json: "{}",
                name: Some("Laptop"),
                device_type: "multi_device",
                backed_up: true,
                transports: &["internal".to_string(), "hybrid".to_string()],
            },
        )
        .await
        .unwrap()
    }

    #[actix_web::test]
    async fn test_save_and_lookup() {
        let pool = test_pool().await;
        let saved = seeded(&pool).await;

        let found = find_by_credential_id(&pool, "cred-abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(found.counter, 0);
        assert!(found.backed_up);
        assert_eq!(found.transports, r#"["internal","hybrid"]"#);
        assert_eq!(found.name.as_deref(), Some("Laptop"));

        let for_user = find_by_user_id(&pool, &saved.user_id).await.unwrap();
        assert_eq!(for_user.len(), 1);
        assert!(find_by_credential_id(&pool, "unknown")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn test_duplicate_credential_rejected() {
        let pool = test_pool().await;
        let saved = seeded(&pool).await;

        let err = save_passkey(
            &pool,
            &NewPasskey {
                user_id: &saved.user_id,
                credential_id: "cred-abc",
                credential_json: "{}",
                name: None,
                device_type: "unknown",
                backed_up: false,
                transports: &[],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[actix_web::test]
    async fn test_delete_is_scoped_to_owner() {
        let pool = test_pool().await;
        let saved = seeded(&pool).await;
        let stranger = create_user(&pool, Some("stranger@example.com"), None, None)
            .await
            .unwrap();

        assert!(!delete_for_user(&pool, &stranger.id, &saved.id).await.unwrap());
        assert!(find_by_credential_id(&pool, "cred-abc").await.unwrap().is_some());

        assert!(delete_for_user(&pool, &saved.user_id, &saved.id).await.unwrap());
        assert!(find_by_credential_id(&pool, "cred-abc").await.unwrap().is_none());
        assert!(!delete_for_user(&pool, &saved.user_id, &saved.id).await.unwrap());
    }

    #[actix_web::test]
    async fn test_counter_is_monotonic() {
        let pool = test_pool().await;
        seeded(&pool).await;

        update_counter(&pool, "cred-abc", 5, "{\"v\":1}")
            .await
            .unwrap();
        // Equal counter is accepted (authenticators without counters report 0 forever)
        update_counter(&pool, "cred-abc", 5, "{\"v\":2}")
            .await
            .unwrap();

        let err = update_counter(&pool, "cred-abc", 4, "{\"v\":3}")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let stored = find_by_credential_id(&pool, "cred-abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.counter, 5);
        assert_eq!(stored.credential, "{\"v\":2}");
        assert!(stored.last_used_at.is_some());
    }
}
