// HTTP request handlers and the route table
pub mod docs;
pub mod health;
pub mod loans;
pub mod oauth;
pub mod passkey;
pub mod session;
pub mod users;

use actix_web::{error::InternalError, web};

use crate::utils::responses::ResponseBuilder;

pub use docs::openapi_json;
pub use health::{health, not_found};

/// Every route, plus the JSON 404 fallback
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/healthz", web::get().to(health))
            // Session state
            .route("/auth/me", web::get().to(session::me))
            .route("/auth/session", web::get().to(session::current_session))
            .route("/auth/signout", web::post().to(session::sign_out))
            .route("/auth/signout-all", web::post().to(session::sign_out_all))
            .route("/auth/sessions", web::get().to(session::list_sessions))
            // Passkeys
            .route("/auth/register/begin", web::post().to(passkey::register_begin))
            .route("/auth/register/finish", web::post().to(passkey::register_finish))
            .route("/auth/login/begin", web::post().to(passkey::login_begin))
            .route("/auth/login/finish", web::post().to(passkey::login_finish))
            .route("/auth/passkeys", web::get().to(passkey::list_passkeys))
            .route("/auth/passkeys/{id}", web::delete().to(passkey::delete_passkey))
            // OAuth
            .route("/auth/signin/{provider}", web::get().to(oauth::sign_in))
            .route("/auth/callback/{provider}", web::get().to(oauth::callback))
            // User data
            .route("/users/me/data", web::get().to(users::get_user_data))
            .route("/users/me/data", web::put().to(users::put_user_data))
            // Loans
            .route("/loans/compare", web::get().to(loans::compare_samples))
            .route("/loans/compare", web::post().to(loans::compare_loans))
            .route("/loans/calculate", web::post().to(loans::calculate)),
    )
    .route("/docs/json", web::get().to(openapi_json))
    .default_service(web::route().to(not_found));
}

/// JSON extractor config answering malformed bodies with 400
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| {
            let response = ResponseBuilder::invalid_json(&err.to_string());
            InternalError::from_response(err, response).into()
        })
}

/// Query string failures use the same body shape
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = ResponseBuilder::bad_request()
            .with_message(&format!("Invalid query string: {err}"))
            .build();
        InternalError::from_response(err, response).into()
    })
}
