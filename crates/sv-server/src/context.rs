//! Application context shared across route handlers.
//!
//! [`AppContext`] is cloned into every handler via Axum state. Everything in
//! it is either cheap to clone or behind an `Arc`; nothing is mutable after
//! startup.

use std::sync::Arc;

use sv_access::{AccessGrantStore, SqliteGrantStore, StreamTokenService};
use sv_core::config::Config;
use sv_core::events::EventBus;
use sv_db::pool::DbPool;

use crate::gateway::StreamGateway;
use crate::middleware::rate_limit::{
    create_limiter, create_user_limiter, SharedLimiter, UserLimiter,
};

#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub event_bus: Arc<EventBus>,
    pub grants: Arc<dyn AccessGrantStore>,
    pub tokens: StreamTokenService,
    pub gateway: Arc<StreamGateway>,
    /// `None` when the configured quota is zero.
    pub login_limiter: Option<SharedLimiter>,
    pub issue_limiter: Option<UserLimiter>,
}

impl AppContext {
    /// Wire up the grant store, token service and gateway over `db`.
    pub fn new(config: Config, db: DbPool) -> sv_core::Result<Self> {
        Self::with_event_bus(config, db, Arc::new(EventBus::default()))
    }

    pub fn with_event_bus(
        config: Config,
        db: DbPool,
        event_bus: Arc<EventBus>,
    ) -> sv_core::Result<Self> {
        let grants: Arc<dyn AccessGrantStore> =
            Arc::new(SqliteGrantStore::new(db.clone(), event_bus.clone()));
        let tokens = StreamTokenService::from_config(
            &config.streaming,
            &config.server,
            db.clone(),
            grants.clone(),
            event_bus.clone(),
        )?;
        let gateway = Arc::new(StreamGateway::new(
            tokens.clone(),
            db.clone(),
            config.storage.clone(),
            config.streaming.effective_chunk_size(),
        ));

        Ok(Self {
            login_limiter: create_limiter(config.auth.login_rate_per_minute),
            issue_limiter: create_user_limiter(config.streaming.issue_rate_per_minute),
            db,
            config: Arc::new(config),
            event_bus,
            grants,
            tokens,
            gateway,
        })
    }
}
