//! Fixed-window request limiting keyed by client IP

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{web, Error, ResponseError};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets
    pub reset_secs: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `key`
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.duration_since(entry.started);
        let reset = self.window.saturating_sub(elapsed);
        RateLimitDecision {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_secs: reset.as_secs() + u64::from(reset.subsec_nanos() > 0),
        }
    }

    /// Drop windows that have already ended
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        before - windows.len()
    }
}

fn set_header(headers: &mut actix_web::http::header::HeaderMap, name: &'static str, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

fn apply_headers(headers: &mut actix_web::http::header::HeaderMap, decision: &RateLimitDecision) {
    set_header(headers, "x-ratelimit-limit", u64::from(decision.limit));
    set_header(headers, "x-ratelimit-remaining", u64::from(decision.remaining));
    set_header(headers, "x-ratelimit-reset", decision.reset_secs);
}

/// Key a request by the socket peer. Forwarded headers are only honoured
/// when the API sits behind a trusted proxy.
fn client_key(req: &ServiceRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = req.connection_info().realip_remote_addr() {
            return ip.to_string();
        }
    }
    req.peer_addr()
        .map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
}

/// `middleware::from_fn` entry point
///
/// # Errors
///
/// Propagates errors from the wrapped service
pub async fn rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let limiter = req
        .app_data::<web::Data<AppState>>()
        .filter(|state| state.settings.rate_limit.enabled)
        .map(|state| {
            (
                state.rate_limiter.clone(),
                state.settings.rate_limit.trust_proxy,
            )
        });

    let Some((limiter, trust_proxy)) = limiter else {
        return Ok(next.call(req).await?.map_into_boxed_body());
    };

    let key = client_key(&req, trust_proxy);
    let decision = limiter.check(&key);

    if !decision.allowed {
        log::warn!("Rate limit exceeded for {key}");
        let mut response = AppError::RateLimited {
            retry_after_secs: decision.reset_secs,
        }
        .error_response();
        apply_headers(response.headers_mut(), &decision);
        return Ok(req.into_response(response).map_into_boxed_body());
    }

    let mut res = next.call(req).await?.map_into_boxed_body();
    apply_headers(res.headers_mut(), &decision);
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let first = limiter.check("10.0.0.1");
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_secs, 60);

        assert!(limiter.check("10.0.0.1").allowed);
        let third = limiter.check("10.0.0.1");
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);

        // separate clients get separate windows
        assert!(limiter.check("10.0.0.2").allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.check_at("ip", start).allowed);
        assert!(!limiter.check_at("ip", start + Duration::from_secs(5)).allowed);

        let later = limiter.check_at("ip", start + Duration::from_secs(10));
        assert!(later.allowed);
        assert_eq!(later.remaining, 0);
    }

    #[test]
    fn test_client_key_ignores_forwarded_headers_by_default() {
        let req = actix_web::test::TestRequest::default()
            .peer_addr("192.0.2.7:40000".parse().unwrap())
            .insert_header(("x-forwarded-for", "10.0.0.1"))
            .to_srv_request();
        assert_eq!(client_key(&req, false), "192.0.2.7");
        assert_eq!(client_key(&req, true), "10.0.0.1");

        let bare = actix_web::test::TestRequest::default().to_srv_request();
        assert_eq!(client_key(&bare, false), "unknown");
    }

    #[test]
    fn test_prune_expired() {
        let limiter = RateLimiter::new(5, Duration::from_millis(0));
        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.prune_expired(), 2);
    }
}
