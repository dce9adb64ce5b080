//! sv-server: HTTP surface for sealview.
//!
//! This crate ties the other sv-* crates into a running server:
//!
//! - Axum API with session auth, admin role checks, rate limiting and
//!   request ids
//! - Stream issuance (`/api/playback`) and the viewer page (`/api/viewer`)
//! - The [`gateway::StreamGateway`] redeeming signed tokens for byte ranges
//! - Admin grant management and the audit feed
//! - Periodic purge of expired login sessions
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod router;
pub mod routes;

use std::time::Duration;

use sv_core::config::Config;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// How often expired login sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Start the sealview server.
///
/// Initializes the database, constructs the [`AppContext`], and serves HTTP
/// until a shutdown signal arrives.
pub async fn start(config: Config) -> sv_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = sv_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    if !config.storage.media_root.is_dir() {
        tracing::warn!(
            "Media root {} does not exist; streams will 404 until it does",
            config.storage.media_root.display()
        );
    }

    let (host, port) = (config.server.host.clone(), config.server.port);

    let ctx = AppContext::new(config, db)?;
    let cancel = CancellationToken::new();

    let purge_handle = tokio::spawn(purge_expired_sessions(ctx.clone(), cancel.clone()));

    let app = router::build_router(ctx);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("sealview listening on {}", listener.local_addr()?);

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    cancel.cancel();
    let _ = purge_handle.await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Delete expired rows from `auth_tokens` until cancelled.
async fn purge_expired_sessions(ctx: AppContext, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        let now = chrono::Utc::now().to_rfc3339();
        let result = sv_db::pool::get_conn(&ctx.db)
            .and_then(|conn| sv_db::queries::auth::delete_expired_tokens(&conn, &now));
        match result {
            Ok(0) => {}
            Ok(n) => tracing::debug!(purged = n, "Purged expired sessions"),
            Err(e) => tracing::warn!("Session purge failed: {e}"),
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
