//! Row types, one per table

use serde::Serialize;
use uuid::Uuid;

use super::now_ms;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    /// Output of `EncryptionService::encrypt_json`, never decrypted in SQL
    #[serde(skip)]
    pub encrypted_data: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    #[must_use]
    pub fn new(email: Option<String>, username: Option<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            encrypted_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name used for the WebAuthn user entity
    #[must_use]
    pub fn display_name(&self) -> String {
        self.email.clone().unwrap_or_else(|| {
            let tail = &self.id[self.id.len().saturating_sub(8)..];
            format!("user-{tail}")
        })
    }
}

/// A registered passkey.
///
/// `credential` holds the serialized `webauthn_rs::prelude::Passkey`; the
/// other columns are denormalized for lookups and listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasskeyRecord {
    pub id: String,
    pub user_id: String,
    pub credential_id: String,
    pub credential: String,
    /// Optional label chosen when the passkey was registered
    pub name: Option<String>,
    pub counter: i64,
    pub device_type: String,
    pub backed_up: bool,
    pub transports: String,
    pub created_at: i64,
    pub last_used_at: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServerSession {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub expires_at: i64,
    pub created_at: i64,
    pub last_used: i64,
}

impl ServerSession {
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    Registration,
    Authentication,
}

impl ChallengeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Authentication => "authentication",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Challenge {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub state: String,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OAuthAccount {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub provider_account_id: String,
    pub created_at: i64,
}
