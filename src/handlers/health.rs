use actix_web::{HttpRequest, HttpResponse};
use chrono::Utc;

use crate::models::HealthResponse;
use crate::utils::responses::ResponseBuilder;

/// Liveness check
pub async fn health() -> HttpResponse {
    ResponseBuilder::ok().json(&HealthResponse {
        status: "ok".to_string(),
        message: "Passkey-only API is running".to_string(),
        timestamp: Utc::now(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    ResponseBuilder::route_not_found(req.method().as_str(), req.path())
}
