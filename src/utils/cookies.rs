use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

pub const SESSION_COOKIE_NAME: &str = "sessionToken";
pub const OAUTH_CSRF_COOKIE_NAME: &str = "oauthCsrf";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: false,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: Duration::days(30),
        }
    }
}

impl CookieOptions {
    #[must_use]
    pub fn build(self, name: &str, value: String) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path)
            .max_age(self.max_age)
            .finish()
    }
}

/// `sessionToken` cookie carrying the server session token
#[must_use]
pub fn session_cookie(token: &str, secure: bool, max_age_days: u64) -> Cookie<'static> {
    CookieOptions {
        secure,
        max_age: Duration::days(i64::try_from(max_age_days).unwrap_or(30)),
        ..CookieOptions::default()
    }
    .build(SESSION_COOKIE_NAME, token.to_string())
}

#[must_use]
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    create_expired_cookie(SESSION_COOKIE_NAME, secure, SameSite::Strict)
}

/// CSRF half of the OAuth state. `Lax` so it survives the provider's top-level redirect back.
#[must_use]
pub fn oauth_csrf_cookie(csrf: &str, secure: bool) -> Cookie<'static> {
    CookieOptions {
        secure,
        same_site: SameSite::Lax,
        max_age: Duration::minutes(10),
        ..CookieOptions::default()
    }
    .build(OAUTH_CSRF_COOKIE_NAME, csrf.to_string())
}

#[must_use]
pub fn cleared_oauth_csrf_cookie(secure: bool) -> Cookie<'static> {
    create_expired_cookie(OAUTH_CSRF_COOKIE_NAME, secure, SameSite::Lax)
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool, same_site: SameSite) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .path("/")
        .max_age(Duration::seconds(0))
        .finish()
}

/// Non-empty value of a request cookie
#[must_use]
pub fn cookie_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
