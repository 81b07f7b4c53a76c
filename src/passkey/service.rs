//! Passkey registration and authentication ceremonies
//!
//! `webauthn-rs` does the protocol work. This service only finds or creates the
//! user, parks the ceremony state in `webauthn_challenges` between the two
//! halves of each ceremony, and records credentials and counters.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use sqlx::SqlitePool;
use url::Url;
use webauthn_rs::prelude::{
    CreationChallengeResponse, CredentialID, Passkey, PasskeyAuthentication,
    PasskeyRegistration, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse, Uuid, Webauthn, WebauthnBuilder,
};

use crate::db::{
    self,
    models::{ChallengeKind, PasskeyRecord, User},
    passkeys::NewPasskey,
};
use crate::error::{AppError, AppResult};
use crate::passkey::PasskeySettings;
use crate::session::{SessionData, SessionService};

#[derive(Debug)]
pub struct RegistrationStart {
    pub options: CreationChallengeResponse,
    pub user_id: String,
}

#[derive(Debug)]
pub struct AuthenticationStart {
    pub options: RequestChallengeResponse,
    pub user_id: String,
}

/// Outcome of a successful ceremony
#[derive(Debug)]
pub struct VerifiedPasskey {
    pub user: User,
    pub session: SessionData,
}

#[derive(Clone)]
pub struct PasskeyService {
    webauthn: Arc<Webauthn>,
    pool: SqlitePool,
    sessions: SessionService,
}

impl PasskeyService {
    /// Build the relying party from settings
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not a valid URL or does not match the rp id
    pub fn new(
        settings: &PasskeySettings,
        pool: SqlitePool,
        sessions: SessionService,
    ) -> anyhow::Result<Self> {
        let origin = Url::parse(&settings.rp_origin)?;
        let webauthn = WebauthnBuilder::new(&settings.rp_id, &origin)?
            .rp_name(&settings.rp_name)
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            webauthn: Arc::new(webauthn),
            pool,
            sessions,
        })
    }

    /// Start registering a passkey, creating the user when needed.
    ///
    /// `signed_in_user` is the id behind the caller's session, if any. An email
    /// that already belongs to an account is only accepted from that account's
    /// own session. A signed-in caller without an email adds a passkey to their
    /// account; an anonymous caller without one gets a new anonymous user.
    pub async fn begin_registration(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        signed_in_user: Option<&str>,
    ) -> AppResult<RegistrationStart> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let user = match (email, signed_in_user) {
            (Some(email), _) => match db::users::find_by_email(&self.pool, email).await? {
                Some(user) if signed_in_user == Some(user.id.as_str()) => user,
                Some(user) => {
                    log::warn!(
                        "Refused passkey registration for existing user {} without their session",
                        user.id
                    );
                    return Err(AppError::Conflict(
                        "An account with this email already exists. Sign in to add a passkey"
                            .to_string(),
                    ));
                }
                None => db::users::create_user(&self.pool, Some(email), username, None).await?,
            },
            (None, Some(user_id)) => db::users::get_by_id(&self.pool, user_id).await?,
            (None, None) => db::users::create_user(&self.pool, None, username, None).await?,
        };

        let existing = db::passkeys::find_by_user_id(&self.pool, &user.id).await?;
        let exclude_credentials: Vec<CredentialID> = existing
            .iter()
            .map(|record| stored_passkey(record).map(|pk| pk.cred_id().clone()))
            .collect::<AppResult<_>>()?;

        let user_uuid = parse_user_uuid(&user.id)?;
        let name = user.display_name();
        let (options, registration) = self.webauthn.start_passkey_registration(
            user_uuid,
            &name,
            &name,
            (!exclude_credentials.is_empty()).then_some(exclude_credentials),
        )?;

        let state = serde_json::to_string(&registration)?;
        db::challenges::save_challenge(&self.pool, &user.id, ChallengeKind::Registration, &state)
            .await?;

        log::info!("🔑 Passkey registration started for user {}", user.id);
        Ok(RegistrationStart {
            options,
            user_id: user.id,
        })
    }

    /// Verify the attestation, store the passkey and open a session
    pub async fn finish_registration(
        &self,
        user_id: &str,
        credential: &Value,
        name: Option<&str>,
    ) -> AppResult<VerifiedPasskey> {
        let user = db::users::get_by_id(&self.pool, user_id).await?;
        let response: RegisterPublicKeyCredential = parse_credential(credential)?;

        let challenge =
            db::challenges::take_challenge(&self.pool, &user.id, ChallengeKind::Registration)
                .await?;
        let registration: PasskeyRegistration = serde_json::from_str(&challenge.state)?;

        let passkey = self
            .webauthn
            .finish_passkey_registration(&response, &registration)?;

        let credential_json = serde_json::to_string(&passkey)?;
        let (backup_eligible, backed_up) = backup_flags(&passkey)?;
        let transports = client_transports(credential);
        db::passkeys::save_passkey(
            &self.pool,
            &NewPasskey {
                user_id: &user.id,
                credential_id: &encode_credential_id(passkey.cred_id()),
                credential_json: &credential_json,
                name: name.map(str::trim).filter(|n| !n.is_empty()),
                device_type: if backup_eligible {
                    "multi_device"
                } else {
                    "unknown"
                },
                backed_up,
                transports: &transports,
            },
        )
        .await?;

        let session = self.sessions.create_session(&user.id).await?;
        log::info!("✅ Passkey registered for user {}", user.id);
        Ok(VerifiedPasskey { user, session })
    }

    /// The user's passkeys, newest first
    pub async fn list_passkeys(&self, user_id: &str) -> AppResult<Vec<PasskeyRecord>> {
        db::passkeys::find_by_user_id(&self.pool, user_id).await
    }

    /// Remove one of the user's passkeys
    ///
    /// # Errors
    ///
    /// Returns 404 when the passkey does not exist or belongs to someone else
    pub async fn delete_passkey(&self, user_id: &str, passkey_id: &str) -> AppResult<()> {
        if !db::passkeys::delete_for_user(&self.pool, user_id, passkey_id).await? {
            return Err(AppError::NotFound("Passkey not found".to_string()));
        }
        log::info!("🗑️  Passkey {passkey_id} removed by user {user_id}");
        Ok(())
    }

    /// Start a sign-in for the account registered under `email`
    pub async fn begin_authentication(&self, email: &str) -> AppResult<AuthenticationStart> {
        let user = db::users::find_by_email(&self.pool, email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let records = db::passkeys::find_by_user_id(&self.pool, &user.id).await?;
        if records.is_empty() {
            return Err(AppError::NotFound(
                "No passkeys registered for this user".to_string(),
            ));
        }
        let passkeys = records
            .iter()
            .map(stored_passkey)
            .collect::<AppResult<Vec<_>>>()?;

        let (options, authentication) = self.webauthn.start_passkey_authentication(&passkeys)?;

        let state = serde_json::to_string(&authentication)?;
        db::challenges::save_challenge(
            &self.pool,
            &user.id,
            ChallengeKind::Authentication,
            &state,
        )
        .await?;

        Ok(AuthenticationStart {
            options,
            user_id: user.id,
        })
    }

    /// Verify the assertion, advance the signature counter and open a session
    pub async fn finish_authentication(
        &self,
        user_id: &str,
        credential: &Value,
    ) -> AppResult<VerifiedPasskey> {
        let user = db::users::get_by_id(&self.pool, user_id).await?;
        let response: PublicKeyCredential = parse_credential(credential)?;

        let challenge =
            db::challenges::take_challenge(&self.pool, &user.id, ChallengeKind::Authentication)
                .await?;
        let authentication: PasskeyAuthentication = serde_json::from_str(&challenge.state)?;

        let credential_id = normalize_credential_id(&response.id)
            .ok_or_else(|| AppError::BadRequest("Invalid credential id".to_string()))?;
        let record = db::passkeys::find_by_credential_id(&self.pool, &credential_id)
            .await?
            .filter(|record| record.user_id == user.id)
            .ok_or_else(|| AppError::NotFound("Passkey not found".to_string()))?;

        let result = self
            .webauthn
            .finish_passkey_authentication(&response, &authentication)
            .inspect_err(|e| {
                log::warn!("❌ Passkey assertion rejected for user {}: {e}", user.id);
            })?;

        let mut passkey = stored_passkey(&record)?;
        passkey.update_credential(&result);
        db::passkeys::update_counter(
            &self.pool,
            &record.credential_id,
            result.counter(),
            &serde_json::to_string(&passkey)?,
        )
        .await?;

        let session = self.sessions.create_session(&user.id).await?;
        log::info!("✅ Passkey sign-in for user {}", user.id);
        Ok(VerifiedPasskey { user, session })
    }
}

fn parse_user_uuid(user_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(user_id).map_err(|_| AppError::Internal(format!("Invalid user id {user_id}")))
}

fn parse_credential<T: serde::de::DeserializeOwned>(credential: &Value) -> AppResult<T> {
    serde_json::from_value(credential.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid credential: {e}")))
}

fn stored_passkey(record: &PasskeyRecord) -> AppResult<Passkey> {
    Ok(serde_json::from_str(&record.credential)?)
}

/// Storage form of a credential id: base64url without padding
fn encode_credential_id(credential_id: &CredentialID) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(credential_id)
}

/// Accept padded or unpadded base64url from the client
fn normalize_credential_id(id: &str) -> Option<String> {
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(id.trim_end_matches('='))
        .ok()?;
    Some(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// `(backup_eligible, backup_state)` as recorded by the authenticator
fn backup_flags(passkey: &Passkey) -> AppResult<(bool, bool)> {
    let value = serde_json::to_value(passkey)?;
    let flag = |name: &str| value["cred"][name].as_bool().unwrap_or(false);
    Ok((flag("backup_eligible"), flag("backup_state")))
}

/// Transport hints reported by the browser (`response.transports`)
fn client_transports(credential: &Value) -> Vec<String> {
    credential["response"]["transports"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
