//! OpenAPI description of the public API

use actix_web::{web, HttpResponse};
use serde_json::{json, Value};

use crate::state::AppState;
use crate::utils::responses::ResponseBuilder;

fn operation(tag: &str, summary: &str, secured: bool) -> Value {
    let mut op = json!({
        "tags": [tag],
        "summary": summary,
        "responses": { "200": { "description": "Success" } },
    });
    if secured {
        op["security"] = json!([{ "sessionCookie": [] }]);
        op["responses"]["401"] = json!({ "description": "Not authenticated" });
    }
    op
}

/// Build the OpenAPI 3 document for a server listening on `port`
#[must_use]
pub fn openapi_document(port: u16) -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Home Loan Helper API",
            "version": crate::VERSION,
            "description": "Secure API for home loan calculations and passkey authentication",
        },
        "servers": [{ "url": format!("http://localhost:{port}") }],
        "components": {
            "securitySchemes": {
                "sessionCookie": {
                    "type": "apiKey",
                    "in": "cookie",
                    "name": "sessionToken",
                },
            },
        },
        "paths": {
            "/api/v1/healthz": { "get": operation("health", "Liveness check", false) },
            "/api/v1/auth/me": { "get": operation("auth", "Current user, if signed in", false) },
            "/api/v1/auth/register/begin": {
                "post": operation("passkeys", "Start passkey registration", false),
            },
            "/api/v1/auth/register/finish": {
                "post": operation("passkeys", "Verify the new passkey and sign in", false),
            },
            "/api/v1/auth/login/begin": {
                "post": operation("passkeys", "Start passkey sign-in", false),
            },
            "/api/v1/auth/login/finish": {
                "post": operation("passkeys", "Verify the assertion and sign in", false),
            },
            "/api/v1/auth/passkeys": {
                "get": operation("passkeys", "List the user's passkeys", true),
            },
            "/api/v1/auth/passkeys/{id}": {
                "delete": operation("passkeys", "Remove one of the user's passkeys", true),
            },
            "/api/v1/auth/signin/{provider}": {
                "get": operation("oauth", "Redirect to an OAuth provider", false),
            },
            "/api/v1/auth/callback/{provider}": {
                "get": operation("oauth", "OAuth provider callback", false),
            },
            "/api/v1/auth/session": { "get": operation("auth", "Current session or null", false) },
            "/api/v1/auth/signout": { "post": operation("auth", "End the current session", false) },
            "/api/v1/auth/signout-all": {
                "post": operation("auth", "End every session of the user", true),
            },
            "/api/v1/auth/sessions": { "get": operation("auth", "List active sessions", true) },
            "/api/v1/users/me/data": {
                "get": operation("users", "Read encrypted preferences", true),
                "put": operation("users", "Replace encrypted preferences", true),
            },
            "/api/v1/loans/compare": {
                "get": operation("loans", "Compare the sample loans", false),
                "post": operation("loans", "Compare the given loans", false),
            },
            "/api/v1/loans/calculate": {
                "post": operation("loans", "Repayments and costs for one loan", false),
            },
        },
    })
}

/// `GET /docs/json`
pub async fn openapi_json(state: web::Data<AppState>) -> HttpResponse {
    ResponseBuilder::ok().json(&openapi_document(state.settings.application.port))
}
