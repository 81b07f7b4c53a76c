//! SQLite persistence
//!
//! Each submodule owns one table and exposes free functions taking the pool,
//! so handlers and services never write SQL themselves.

pub mod accounts;
pub mod challenges;
pub mod models;
pub mod passkeys;
pub mod sessions;
pub mod users;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open the pool and bring the schema up to date.
///
/// The database file is created when missing. An in-memory database keeps its
/// connections alive forever, otherwise the schema would vanish with them.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database cannot be opened, or a
/// migration fails
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
    if url.contains(":memory:") {
        // every connection to :memory: is its own database
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    log::info!("🗄️  Database ready at {url}");
    Ok(pool)
}

/// Current time in Unix milliseconds, the storage format for every timestamp column
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[must_use]
pub fn to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_connect_runs_migrations() {
        let pool = connect("sqlite::memory:", 1).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        for expected in [
            "oauth_accounts",
            "passkeys",
            "server_sessions",
            "users",
            "webauthn_challenges",
        ] {
            assert!(names.contains(&expected), "missing table {expected}");
        }
    }

    #[actix_web::test]
    async fn test_connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect(&url, 2).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }

    #[test]
    fn test_millisecond_round_trip() {
        let now = now_ms();
        assert_eq!(to_datetime(now).timestamp_millis(), now);
        assert_eq!(to_datetime(0), DateTime::<Utc>::UNIX_EPOCH);
    }
}
