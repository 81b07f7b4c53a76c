//! Encrypted per-user preferences

use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::SuccessResponse;
use crate::session::AuthenticatedSession;
use crate::state::AppState;
use crate::utils::responses::ResponseBuilder;

/// `GET /users/me/data`; the stored document, or `null` when nothing is saved
///
/// A blob that no longer decrypts (for instance after the encryption key
/// changed) is reported as `null` rather than failing every request.
///
/// # Errors
///
/// Returns 401 without a session
pub async fn get_user_data(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
) -> AppResult<HttpResponse> {
    let data = auth
        .user
        .encrypted_data
        .as_deref()
        .and_then(|encrypted| {
            state
                .encryption
                .decrypt_json::<Value>(encrypted)
                .inspect_err(|e| {
                    log::warn!("Stored data for user {} is unreadable: {e:#}", auth.user.id);
                })
                .ok()
        })
        .unwrap_or(Value::Null);
    Ok(ResponseBuilder::ok().json(&data))
}

/// `PUT /users/me/data`; replaces the stored document
///
/// # Errors
///
/// Returns 401 without a session
pub async fn put_user_data(
    state: web::Data<AppState>,
    auth: AuthenticatedSession,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let data = body.into_inner();
    let encrypted = if data.is_null() {
        None
    } else {
        Some(
            state
                .encryption
                .encrypt_json(&data)
                .map_err(|e| AppError::Crypto(e.to_string()))?,
        )
    };

    db::users::update_encrypted_data(&state.db, &auth.user.id, encrypted.as_deref()).await?;
    log::debug!("Updated stored data for user {}", auth.user.id);
    Ok(ResponseBuilder::ok().json(&SuccessResponse::ok()))
}
