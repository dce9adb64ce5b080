//! Stream issuance.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use sv_access::IssuedStream;
use sv_core::MediaId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::routes::parse_id;

/// GET /api/playback/{media_id}
///
/// Mints a fresh stream token. The viewer calls this again shortly before
/// the previous token expires.
#[utoipa::path(
    get,
    path = "/api/playback/{media_id}",
    params(("media_id" = String, Path, description = "Media item id")),
    responses(
        (status = 200, description = "Stream issued", body = IssuedStream),
        (status = 401, description = "No session"),
        (status = 403, description = "No grant for this media"),
        (status = 404, description = "Unknown media"),
        (status = 429, description = "Issuance rate limit exceeded")
    )
)]
pub async fn issue_stream(
    State(ctx): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(media_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let media_id: MediaId = parse_id(&media_id, "media")?;
    let issued = ctx.tokens.issue(user.id, media_id)?;
    Ok(([(header::CACHE_CONTROL, "no-store, private")], Json(issued)))
}
