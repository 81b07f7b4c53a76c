use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{
    models::{PasskeyRecord, User},
    to_datetime,
};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /auth/register/begin`; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct BeginRegistrationRequest {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBeginRequest {
    pub email: String,
}

/// Second half of either passkey ceremony
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRequest {
    pub user_id: String,
    pub credential: Value,
    /// Label for a newly registered passkey; ignored on sign-in
    #[serde(default)]
    pub name: Option<String>,
}

/// Challenge options plus the user the ceremony belongs to
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyStartResponse<T: Serialize> {
    pub options: T,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResponse {
    pub verified: bool,
    pub session_token: String,
}

/// The public view of a user; never includes the encrypted blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            created_at: to_datetime(user.created_at),
            updated_at: to_datetime(user.updated_at),
        }
    }
}

/// A registered passkey as shown to its owner
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyInfo {
    pub id: String,
    pub name: Option<String>,
    pub device_type: String,
    pub backed_up: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<&PasskeyRecord> for PasskeyInfo {
    fn from(record: &PasskeyRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            device_type: record.device_type.clone(),
            backed_up: record.backed_up,
            created_at: to_datetime(record.created_at),
            last_used_at: record.last_used_at.map(to_datetime),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PasskeysResponse {
    pub passkeys: Vec<PasskeyInfo>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_removed: Option<u64>,
}

impl SuccessResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            sessions_removed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    /// Where the frontend wants to land after sign-in
    #[serde(alias = "callback_url")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub sort: Option<String>,
}
