//! Response hardening headers.
//!
//! Handlers that need a different value (the viewer page and stream bodies
//! allow same-origin framing) set the header themselves; defaults only fill
//! gaps.

use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

const DEFAULTS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("cache-control", "no-store"),
];

pub async fn security_headers_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in DEFAULTS {
        if !headers.contains_key(name) {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
    }
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(), display-capture=()"),
    );
    headers.remove(header::SERVER);

    response
}
