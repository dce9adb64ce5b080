//! Axum router construction.
//!
//! Builds the full application router with all route groups and middleware
//! layers.

use axum::http::{header, Method};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::{
    rate_limit_middleware, user_rate_limit_middleware, SharedLimiter, UserLimiter,
};
use crate::middleware::request_id::request_id_middleware;
use crate::middleware::security_headers::security_headers_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::playback::issue_stream,
        routes::viewer::viewer_page,
        routes::stream::stream_media,
        routes::admin::create_grant,
        routes::admin::revoke_grant,
        routes::admin::list_user_grants,
        routes::admin::list_media_grants,
        routes::admin::list_users,
        routes::admin::list_media,
        routes::audit::recent_events,
        routes::health::health_check,
    ),
    components(schemas(
        routes::auth::LoginRequest,
        routes::auth::AuthResponse,
        routes::auth::AuthStatusResponse,
        routes::admin::GrantRequest,
        routes::admin::GrantResponse,
        routes::admin::UserGrantsResponse,
        routes::admin::MediaGrantsResponse,
        routes::admin::UserResponse,
        routes::admin::MediaResponse,
        routes::health::HealthResponse,
        sv_access::IssuedStream,
        sv_core::Role,
        sv_core::MediaKind,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Attach `limiter` (when configured) to every route in `router`.
fn rate_limited(router: Router<AppContext>, limiter: Option<SharedLimiter>) -> Router<AppContext> {
    match limiter {
        Some(limiter) => router
            .layer(middleware::from_fn(rate_limit_middleware))
            .layer(Extension(limiter)),
        None => router,
    }
}

/// Attach a per-user `limiter`; the group must sit under the auth layer.
fn user_rate_limited(
    router: Router<AppContext>,
    limiter: Option<UserLimiter>,
) -> Router<AppContext> {
    match limiter {
        Some(limiter) => router
            .layer(middleware::from_fn(user_rate_limit_middleware))
            .layer(Extension(limiter)),
        None => router,
    }
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::RANGE])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
        ]);

    // Session-free routes.
    let login = rate_limited(
        Router::new().route("/auth/login", post(routes::auth::login)),
        ctx.login_limiter.clone(),
    );
    let public_routes = Router::new()
        .merge(login)
        .route("/auth/status", get(routes::auth::auth_status))
        // The signed token is the credential.
        .route("/stream/{token}", get(routes::stream::stream_media));

    // Issuance, in both its JSON and HTML forms.
    let issuance = user_rate_limited(
        Router::new()
            .route("/playback/{media_id}", get(routes::playback::issue_stream))
            .route("/viewer/{media_id}", get(routes::viewer::viewer_page)),
        ctx.issue_limiter.clone(),
    );

    let admin_routes = Router::new()
        .route("/admin/grants", post(routes::admin::create_grant))
        .route(
            "/admin/grants/{user_id}/{media_id}",
            delete(routes::admin::revoke_grant),
        )
        .route(
            "/admin/users/{user_id}/grants",
            get(routes::admin::list_user_grants),
        )
        .route(
            "/admin/media/{media_id}/grants",
            get(routes::admin::list_media_grants),
        )
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/media", get(routes::admin::list_media))
        .route("/admin/audit", get(routes::audit::recent_events))
        .route("/admin/audit/stream", get(routes::audit::event_stream))
        .layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .merge(issuance)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let api = public_routes.merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
