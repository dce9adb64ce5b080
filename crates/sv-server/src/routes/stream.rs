//! Stream token redemption.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/stream/{token}
///
/// The token is the only credential; no session is consulted.
#[utoipa::path(
    get,
    path = "/api/stream/{token}",
    params(
        ("token" = String, Path, description = "Signed stream token"),
        ("Range" = Option<String>, Header, description = "Single byte range")
    ),
    responses(
        (status = 200, description = "Whole asset"),
        (status = 206, description = "Requested byte window"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "Media or file not found"),
        (status = 416, description = "Range not satisfiable")
    )
)]
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let range = headers.get(header::RANGE);
    Ok(ctx.gateway.handle_request(&token, range).await?)
}
