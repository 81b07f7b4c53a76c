//! HTTP response handling
//!
//! One place that decides what error bodies and JSON replies look like, so
//! handlers, extractors and middleware all answer the same way.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};

// ===============================
// CACHED RESPONSES
// ===============================

static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Pre-serialized bodies for errors returned without customization
struct CachedResponses {
    invalid_request: String,
    unauthorized: String,
    not_found: String,
    conflict: String,
    rate_limited: String,
    server_error: String,
    service_unavailable: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            invalid_request: Self::create_json(
                "invalid_request",
                "The request is malformed or invalid",
            ),
            unauthorized: Self::create_json(
                "unauthorized",
                "Authentication is required to access this resource",
            ),
            not_found: Self::create_json("not_found", "The requested resource was not found"),
            conflict: Self::create_json(
                "conflict",
                "The request conflicts with the current state of the resource",
            ),
            rate_limited: Self::create_json(
                "rate_limited",
                "Too many requests. Please try again later.",
            ),
            server_error: Self::create_json("server_error", "An internal server error occurred"),
            service_unavailable: Self::create_json(
                "service_unavailable",
                "The service is temporarily unavailable",
            ),
        }
    }

    fn create_json(error: &str, message: &str) -> String {
        json!({ "error": error, "message": message }).to_string()
    }

    fn body_for(&self, error_type: ErrorType) -> &str {
        match error_type {
            ErrorType::BadRequest => &self.invalid_request,
            ErrorType::Unauthorized => &self.unauthorized,
            ErrorType::NotFound => &self.not_found,
            ErrorType::Conflict => &self.conflict,
            ErrorType::TooManyRequests => &self.rate_limited,
            ErrorType::InternalServerError => &self.server_error,
            ErrorType::ServiceUnavailable => &self.service_unavailable,
        }
    }
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    #[must_use]
    pub fn not_found() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::NotFound)
    }

    #[must_use]
    pub fn conflict() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Conflict)
    }

    #[must_use]
    pub fn too_many_requests() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::TooManyRequests)
    }

    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    #[must_use]
    pub fn service_unavailable() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::ServiceUnavailable)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// 200 with a JSON body
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }

    /// 302 to `location`, setting every cookie given
    #[must_use]
    pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header((header::LOCATION, location.to_string()))
            .finish()
    }

    // ===============================
    // CONVENIENCE METHODS
    // ===============================

    #[must_use]
    pub fn route_not_found(method: &str, path: &str) -> HttpResponse {
        Self::not_found()
            .with_message(&format!("Route {method} {path} not found"))
            .build()
    }

    #[must_use]
    pub fn invalid_json(reason: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("invalid_request")
            .with_message(&format!("Invalid JSON body: {reason}"))
            .build()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
    headers: Vec<(String, String)>,
}

/// Builder for JSON responses
pub struct JsonResponseBuilder {
    status_code: StatusCode,
    cookies: Vec<Cookie<'static>>,
}

#[derive(Clone, Copy)]
enum ErrorType {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    TooManyRequests,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorType {
    fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn default_error_code(self) -> &'static str {
        match self {
            Self::BadRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::TooManyRequests => "rate_limited",
            Self::InternalServerError => "server_error",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
            headers: Vec::new(),
        }
    }

    /// Set a custom error code (e.g., "`invalid_request`", "`webauthn_error`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut response = HttpResponse::build(self.error_type.status());
        response.insert_header((header::CONTENT_TYPE, "application/json"));
        for (name, value) in &self.headers {
            response.insert_header((name.as_str(), value.as_str()));
        }

        if self.error_code.is_none() && self.message.is_none() {
            return response.body(CACHED_RESPONSES.body_for(self.error_type).to_owned());
        }

        let mut json_body = json!({
            "error": self
                .error_code
                .unwrap_or_else(|| self.error_type.default_error_code().to_string()),
        });
        if let Some(message) = self.message {
            json_body["message"] = Value::String(message);
        }

        response.body(json_body.to_string())
    }
}

impl JsonResponseBuilder {
    fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn json<T: Serialize>(self, data: &T) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code);
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.json(data)
    }
}
