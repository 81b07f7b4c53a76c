//! Post sign-in redirect handling
//!
//! Callers may ask to land on a page after an OAuth round-trip. Only paths on
//! the frontend are honoured; anything else falls back to the frontend root.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

static PATH_TRAVERSAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\.").expect("path traversal pattern"));

static PROTOCOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)|(?:/{2,})").expect("protocol pattern")
});

// Control characters, backslashes, encoded NUL/CR/LF/backslash and invisible spacing
static SUSPICIOUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[ad]|09|5c)|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]",
    )
    .expect("suspicious pattern")
});

const MAX_REDIRECT_LENGTH: usize = 2048;

/// Reduce a requested callback to a safe path on the frontend
///
/// Accepts a relative path or an absolute URL on the frontend origin and
/// returns the path (with query and fragment). Returns `None` when the target
/// is elsewhere or looks like an injection attempt.
#[must_use]
pub fn sanitize_callback_url(callback_url: &str, frontend_url: &str) -> Option<String> {
    let callback_url = callback_url.trim();
    if callback_url.is_empty() || callback_url.len() > MAX_REDIRECT_LENGTH {
        return None;
    }

    let path = if is_relative_url(callback_url) {
        callback_url.to_string()
    } else {
        same_origin_path(callback_url, frontend_url)?
    };

    if decoded_variants(&path).iter().any(|candidate| is_suspicious(candidate)) {
        warn!("Rejected post sign-in redirect: {callback_url}");
        return None;
    }

    debug!("Accepted post sign-in redirect: {path}");
    Some(path)
}

/// Absolute frontend URL for a sanitized path
#[must_use]
pub fn frontend_redirect(frontend_url: &str, path: Option<&str>) -> String {
    let base = frontend_url.trim_end_matches('/');
    match path {
        Some(path) => format!("{base}{path}"),
        None => format!("{base}/"),
    }
}

/// Frontend error page for a failed sign-in
#[must_use]
pub fn frontend_error_redirect(frontend_url: &str, code: &str) -> String {
    format!(
        "{}/auth/error?error={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(code)
    )
}

fn is_relative_url(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains(':')
}

fn same_origin_path(callback_url: &str, frontend_url: &str) -> Option<String> {
    let target = url::Url::parse(callback_url).ok()?;
    let frontend = url::Url::parse(frontend_url).ok()?;
    if target.origin() != frontend.origin() {
        warn!("Rejected cross-origin redirect: {callback_url}");
        return None;
    }

    let mut path = target.path().to_string();
    if let Some(query) = target.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = target.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    Some(path)
}

fn is_suspicious(candidate: &str) -> bool {
    PATH_TRAVERSAL_PATTERN.is_match(candidate)
        || PROTOCOL_PATTERN.is_match(candidate.trim_start_matches('/'))
        || candidate.starts_with("//")
        || SUSPICIOUS_PATTERN.is_match(candidate)
        || candidate.matches('@').count() > 1
}

/// The path as given plus up to two rounds of percent-decoding
fn decoded_variants(path: &str) -> Vec<String> {
    let mut variants = vec![path.to_string()];
    let mut current = path.to_string();
    for _ in 0..2 {
        match urlencoding::decode(&current) {
            Ok(decoded) if decoded != current => {
                current = decoded.into_owned();
                variants.push(current.clone());
            }
            _ => break,
        }
    }
    variants
}
