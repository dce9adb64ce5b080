//! Governor-based rate limiting middleware.
//!
//! Limiters are attached per route group as request extensions; groups
//! without one pass through untouched. Login is limited globally, issuance
//! per authenticated user.

use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use sv_core::UserId;

use super::auth::AuthUser;

/// A shared rate limiter instance.
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// A limiter holding one budget per user.
pub type UserLimiter = Arc<DefaultKeyedRateLimiter<UserId>>;

/// Create a rate limiter with the given requests-per-minute quota.
///
/// A quota of zero disables limiting and returns `None`.
pub fn create_limiter(requests_per_minute: u32) -> Option<SharedLimiter> {
    let rpm = NonZeroU32::new(requests_per_minute)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_minute(rpm))))
}

/// Create a per-user limiter; each user gets the full quota.
pub fn create_user_limiter(requests_per_minute: u32) -> Option<UserLimiter> {
    let rpm = NonZeroU32::new(requests_per_minute)?;
    Some(Arc::new(RateLimiter::keyed(Quota::per_minute(rpm))))
}

fn too_many_requests() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "Rate limit exceeded",
            "code": "rate_limited",
            "request_id": super::request_id::current_request_id(),
        })),
    )
        .into_response()
}

/// Rate limiting middleware. Returns 429 Too Many Requests when exceeded.
pub async fn rate_limit_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let limiter = request.extensions().get::<SharedLimiter>().cloned();

    if let Some(limiter) = limiter {
        if limiter.check().is_err() {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            return Err(too_many_requests());
        }
    }

    Ok(next.run(request).await)
}

/// Per-user rate limiting. Must run inside the auth layer; requests without
/// an [`AuthUser`] pass through.
pub async fn user_rate_limit_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let limiter = request.extensions().get::<UserLimiter>().cloned();
    let user = request.extensions().get::<AuthUser>().map(|u| u.id);

    if let (Some(limiter), Some(user_id)) = (limiter, user) {
        if limiter.check_key(&user_id).is_err() {
            tracing::warn!(%user_id, path = %request.uri().path(), "Rate limit exceeded");
            return Err(too_many_requests());
        }
    }

    Ok(next.run(request).await)
}
