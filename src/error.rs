//! Application error type and its HTTP mapping

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    ServiceUnavailable(String),

    /// Passkey ceremony verification failed
    #[error("WebAuthn error: {0}")]
    WebAuthn(#[from] webauthn_rs::prelude::WebauthnError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::WebAuthn(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Crypto(_) | Self::Serialization(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::BadRequest(message) => ResponseBuilder::bad_request()
                .with_error_code("bad_request")
                .with_message(message)
                .build(),
            Self::Unauthorized(message) => ResponseBuilder::unauthorized()
                .with_message(message)
                .build(),
            Self::NotFound(message) => ResponseBuilder::not_found().with_message(message).build(),
            Self::Conflict(message) => ResponseBuilder::conflict().with_message(message).build(),
            Self::RateLimited { retry_after_secs } => ResponseBuilder::too_many_requests()
                .with_message("Too many requests. Please try again later.")
                .with_header("retry-after", &retry_after_secs.to_string())
                .build(),
            Self::ServiceUnavailable(message) => ResponseBuilder::service_unavailable()
                .with_message(message)
                .build(),
            Self::WebAuthn(err) => {
                log::warn!("Passkey verification failed: {err:?}");
                ResponseBuilder::bad_request()
                    .with_error_code("webauthn_error")
                    .with_message("Passkey verification failed")
                    .build()
            }
            Self::Database(_) | Self::Crypto(_) | Self::Serialization(_) | Self::Internal(_) => {
                error!("{self}");
                ResponseBuilder::internal_server_error().build()
            }
        }
    }
}
