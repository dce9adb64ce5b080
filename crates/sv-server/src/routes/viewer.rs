//! The viewer page: issuance rendered through a [`sv_viewer::ViewerShell`].

use axum::extract::{Path, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;
use rand::RngCore;
use sv_core::{Error, MediaId};
use sv_viewer::{content_security_policy, shell_for, ViewerConfig, ViewerPage};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::routes::parse_id;

/// Fresh per-response nonce for inline script and style.
fn nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Scheme, host and port of `url`, when it is absolute.
fn origin_of(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || rest.is_empty() {
        return None;
    }
    let host_len = rest.find('/').unwrap_or(rest.len());
    Some(&url[..scheme.len() + 3 + host_len])
}

/// GET /api/viewer/{media_id}
#[utoipa::path(
    get,
    path = "/api/viewer/{media_id}",
    params(("media_id" = String, Path, description = "Media item id")),
    responses(
        (status = 200, description = "Viewer HTML page", content_type = "text/html"),
        (status = 401, description = "No session"),
        (status = 403, description = "No grant for this media"),
        (status = 404, description = "Unknown media")
    )
)]
pub async fn viewer_page(
    State(ctx): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(media_id): Path<String>,
) -> Result<Response, AppError> {
    let media_id: MediaId = parse_id(&media_id, "media")?;
    let issued = ctx.tokens.issue(user.id, media_id)?;

    let config = ViewerConfig::for_issuance(&issued, &ctx.config.viewer);
    let page = ViewerPage::new(&issued, &config);
    let shell = shell_for(config.mode, page.kind());
    let nonce = nonce();
    let html = shell.render(&page, &nonce);

    tracing::debug!(
        user_id = %user.id,
        media_id = %media_id,
        shell = ?shell.mode(),
        restrictions = page.plan().len(),
        "Rendered viewer page"
    );

    let csp = content_security_policy(&nonce, origin_of(&ctx.config.server.public_base_url));
    let csp = HeaderValue::from_str(&csp)
        .map_err(|e| Error::Internal(format!("Invalid CSP header: {e}")))?;

    let mut response = Html(html).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_SECURITY_POLICY, csp);
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store, private"));
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    Ok(response)
}
