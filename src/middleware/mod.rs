//! Request middleware
//!
//! - [`security_headers`] - helmet-style response headers
//! - [`rate_limit`] - fixed-window per-IP request limiting
//! - [`cors`] - CORS locked to the frontend origin

pub mod rate_limit;
pub mod security_headers;

use actix_cors::Cors;

pub use rate_limit::{rate_limit, RateLimitDecision, RateLimiter};
pub use security_headers::security_headers;

/// Only the frontend may call the API from a browser, with cookies
#[must_use]
pub fn cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url.trim_end_matches('/'))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", "Accept"])
        .supports_credentials()
        .max_age(3600)
}
