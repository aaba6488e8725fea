//! Security response headers.
//!
//! Each header is set only when the handler did not set it already.

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// Fixed hardening headers sent with every response.
pub const STATIC_HEADERS: &[(&str, &str)] = &[
    ("strict-transport-security", "max-age=31536000; includeSubDomains; preload"),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), interest-cohort=()",
    ),
    ("x-xss-protection", "1; mode=block"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
];

/// All headers to apply, including the configured CSP.
pub fn security_headers(content_security_policy: &str) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers: Vec<(HeaderName, HeaderValue)> = STATIC_HEADERS
        .iter()
        .map(|&(name, value)| {
            (
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
        .collect();

    match HeaderValue::from_str(content_security_policy) {
        Ok(value) => headers.push((header::CONTENT_SECURITY_POLICY, value)),
        Err(_) => tracing::error!("Invalid Content-Security-Policy, header not sent"),
    }

    headers
}

/// Wrap a router with one `SetResponseHeaderLayer` per security header.
pub fn apply(router: Router, content_security_policy: &str) -> Router {
    security_headers(content_security_policy)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}
