//! Authentication route handlers: login, logout, status.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sv_core::{Error, Role};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::{extract_token, resolve_session, SESSION_COOKIE};

/// Login request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// 32 random bytes, hex encoded.
fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
    ))
    .map_err(|e| Error::Internal(format!("Invalid cookie value: {e}")))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = {
        let conn = sv_db::pool::get_conn(&ctx.db)?;
        sv_db::queries::users::get_user_by_username(&conn, &payload.username)?
    };

    // Verify against a fixed hash for unknown users too, so timing does not
    // reveal which usernames exist.
    let hash = user
        .as_ref()
        .map(|u| u.password_hash.clone())
        .unwrap_or_else(|| UNKNOWN_USER_HASH.to_string());
    let password = payload.password;
    let password_valid = tokio::task::spawn_blocking(move || {
        bcrypt::verify(&password, &hash).unwrap_or(false)
    })
    .await
    .map_err(|e| Error::Internal(format!("Password check failed: {e}")))?;

    let user = match user {
        Some(u) if password_valid => u,
        _ => {
            tracing::info!(username = %payload.username, "Failed login attempt");
            return Err(Error::Unauthorized("Invalid credentials".into()).into());
        }
    };

    let token = new_session_token();
    let hours = ctx.config.auth.session_timeout_hours as i64;
    let expires = Utc::now() + Duration::hours(hours);
    {
        let conn = sv_db::pool::get_conn(&ctx.db)?;
        sv_db::queries::auth::create_token(&conn, user.id, &token, &expires.to_rfc3339())?;
    }

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    let cookie = session_cookie(&token, hours * 3600)?;
    let mut response = Json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        token: Some(token),
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// A valid bcrypt hash of a random string, never matched in practice.
const UNKNOWN_USER_HASH: &str = "$2b$12$C6UzMDM.H6dfI/f/IKcEeO5K8hG1p6rD/9xWvO0N0kq0Yt0rQxY8u";

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "No session")
    )
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(&headers) {
        let conn = sv_db::pool::get_conn(&ctx.db)?;
        sv_db::queries::auth::delete_token(&conn, &token)?;
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok(response)
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Auth status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<AuthStatusResponse>, AppError> {
    let user = match extract_token(&headers) {
        Some(token) => resolve_session(&ctx.db, &token)?,
        None => None,
    };

    Ok(Json(match user {
        Some(u) => AuthStatusResponse {
            authenticated: true,
            user_id: Some(u.id.to_string()),
            username: Some(u.username),
            role: Some(u.role),
        },
        None => AuthStatusResponse {
            authenticated: false,
            user_id: None,
            username: None,
            role: None,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tokens_are_long_and_distinct() {
        let a = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, new_session_token());
    }

    #[test]
    fn cookie_attributes() {
        let c = session_cookie("abc", 3600).unwrap();
        let c = c.to_str().unwrap();
        assert!(c.starts_with("sealview_session=abc;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("SameSite=Strict"));
        assert!(c.contains("Max-Age=3600"));
    }
}
