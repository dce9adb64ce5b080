//! Session authentication and role enforcement.
//!
//! Sessions are opaque tokens stored in `auth_tokens`, presented either as
//! `Authorization: Bearer <token>` or in the [`SESSION_COOKIE`] cookie.
//! [`auth_middleware`] resolves the token to an [`AuthUser`] and inserts it
//! into request extensions for downstream handlers.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use sv_core::{Error, Role, UserId};
use sv_db::pool::DbPool;

use crate::context::AppContext;
use crate::error::AppError;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "sealview_session";

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Pull the session token from the request headers.
///
/// Resolution order:
/// 1. `Authorization: Bearer <token>`
/// 2. Cookie: `sealview_session=<token>`
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let cookies = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    let prefix = format!("{SESSION_COOKIE}=");
    cookies
        .split(';')
        .filter_map(|part| part.trim().strip_prefix(prefix.as_str()))
        .find(|v| !v.is_empty())
        .map(String::from)
}

/// Resolve a session token to its user.
///
/// Returns `Ok(None)` for unknown or expired sessions; expired rows are
/// deleted on sight.
pub fn resolve_session(db: &DbPool, token: &str) -> sv_core::Result<Option<AuthUser>> {
    let conn = sv_db::pool::get_conn(db)?;
    let Some(session) = sv_db::queries::auth::get_token(&conn, token)? else {
        return Ok(None);
    };

    let expired = DateTime::parse_from_rfc3339(&session.expires_at)
        .map(|t| t.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);
    if expired {
        tracing::debug!(user_id = %session.user_id, "Session expired");
        sv_db::queries::auth::delete_token(&conn, token)?;
        return Ok(None);
    }

    let user = sv_db::queries::users::get_user_by_id(&conn, session.user_id)?;
    Ok(user.map(|u| AuthUser {
        id: u.id,
        username: u.username,
        role: u.role,
    }))
}

/// Authentication middleware. Applied to protected routes only.
///
/// On success, inserts the resolved [`AuthUser`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = match extract_token(request.headers()) {
        Some(token) => resolve_session(&ctx.db, &token)?,
        None => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => Err(Error::Unauthorized("Authentication required".into()).into()),
    }
}

/// Reject non-admin callers with 403. Must run inside [`auth_middleware`].
pub async fn require_admin(request: Request<axum::body::Body>, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin() => next.run(request).await,
        Some(user) => {
            tracing::warn!(
                user_id = %user.id,
                path = %request.uri().path(),
                "Non-admin caller rejected from admin route"
            );
            AppError::new(Error::Forbidden("Admin role required".into())).into_response()
        }
        None => AppError::new(Error::Unauthorized("Authentication required".into()))
            .into_response(),
    }
}
