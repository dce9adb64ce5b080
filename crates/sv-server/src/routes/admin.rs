//! Admin route handlers: grant management and catalog listings.
//!
//! Every route here sits behind `require_admin`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use sv_core::{MediaId, MediaKind, Role, UserId};
use sv_db::models::AccessGrant;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::routes::parse_id;

/// Grant request payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = String)]
    pub media_id: MediaId,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = String)]
    pub media_id: MediaId,
    #[schema(value_type = String)]
    pub granted_by: UserId,
    pub granted_at: String,
}

impl From<AccessGrant> for GrantResponse {
    fn from(g: AccessGrant) -> Self {
        Self {
            user_id: g.user_id,
            media_id: g.media_id,
            granted_by: g.granted_by,
            granted_at: g.granted_at,
        }
    }
}

/// Media ids a user may view.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserGrantsResponse {
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = Vec<String>)]
    pub media_ids: Vec<MediaId>,
}

/// User ids allowed to view one media item.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaGrantsResponse {
    #[schema(value_type = String)]
    pub media_id: MediaId,
    #[schema(value_type = Vec<String>)]
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String)]
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    #[schema(value_type = String)]
    pub id: MediaId,
    pub title: String,
    pub kind: MediaKind,
    pub content_type: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: String,
}

/// POST /api/admin/grants
///
/// Idempotent: granting an existing pair returns the original record.
#[utoipa::path(
    post,
    path = "/api/admin/grants",
    request_body = GrantRequest,
    responses(
        (status = 200, description = "Grant in place", body = GrantResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Unknown user or media")
    )
)]
pub async fn create_grant(
    State(ctx): State<AppContext>,
    Extension(admin): Extension<AuthUser>,
    Json(req): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, AppError> {
    let grant = ctx.grants.grant(req.user_id, req.media_id, admin.id)?;
    Ok(Json(grant.into()))
}

/// DELETE /api/admin/grants/{user_id}/{media_id}
#[utoipa::path(
    delete,
    path = "/api/admin/grants/{user_id}/{media_id}",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("media_id" = String, Path, description = "Media item id")
    ),
    responses(
        (status = 204, description = "No grant remains"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Unknown user or media")
    )
)]
pub async fn revoke_grant(
    State(ctx): State<AppContext>,
    Path((user_id, media_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id: UserId = parse_id(&user_id, "user")?;
    let media_id: MediaId = parse_id(&media_id, "media")?;
    ctx.grants.revoke(user_id, media_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/users/{user_id}/grants
#[utoipa::path(
    get,
    path = "/api/admin/users/{user_id}/grants",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Granted media ids", body = UserGrantsResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn list_user_grants(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> Result<Json<UserGrantsResponse>, AppError> {
    let user_id: UserId = parse_id(&user_id, "user")?;
    let media_ids = ctx.grants.list_for_user(user_id)?;
    Ok(Json(UserGrantsResponse {
        user_id,
        media_ids: media_ids.into_iter().collect(),
    }))
}

/// GET /api/admin/media/{media_id}/grants
#[utoipa::path(
    get,
    path = "/api/admin/media/{media_id}/grants",
    params(("media_id" = String, Path, description = "Media item id")),
    responses(
        (status = 200, description = "Users holding a grant", body = MediaGrantsResponse),
        (status = 404, description = "Unknown media")
    )
)]
pub async fn list_media_grants(
    State(ctx): State<AppContext>,
    Path(media_id): Path<String>,
) -> Result<Json<MediaGrantsResponse>, AppError> {
    let media_id: MediaId = parse_id(&media_id, "media")?;
    let user_ids = ctx.grants.list_for_media(media_id)?;
    Ok(Json(MediaGrantsResponse {
        media_id,
        user_ids: user_ids.into_iter().collect(),
    }))
}

/// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All users", body = Vec<UserResponse>))
)]
pub async fn list_users(State(ctx): State<AppContext>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let conn = sv_db::pool::get_conn(&ctx.db)?;
    let users = sv_db::queries::users::list_users(&conn)?
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            username: u.username,
            role: u.role,
            created_at: u.created_at,
        })
        .collect();
    Ok(Json(users))
}

/// GET /api/admin/media
#[utoipa::path(
    get,
    path = "/api/admin/media",
    responses((status = 200, description = "Media catalog", body = Vec<MediaResponse>))
)]
pub async fn list_media(State(ctx): State<AppContext>) -> Result<Json<Vec<MediaResponse>>, AppError> {
    let conn = sv_db::pool::get_conn(&ctx.db)?;
    let items = sv_db::queries::media::list_media(&conn)?
        .into_iter()
        .map(|m| MediaResponse {
            id: m.id,
            title: m.title,
            kind: m.kind,
            content_type: m.content_type,
            thumbnail: m.thumbnail,
            created_at: m.created_at,
        })
        .collect();
    Ok(Json(items))
}
