//! Access grant store.

use std::collections::BTreeSet;
use std::sync::Arc;

use sv_core::events::{AuditPayload, EventBus};
use sv_core::{MediaId, Result, UserId};
use sv_db::models::AccessGrant;
use sv_db::pool::{get_conn, DbPool};
use sv_db::queries::grants;

/// Persistent record of which user may view which media item.
///
/// Implementations must be safe to call concurrently for the same pair; a
/// grant racing a revoke resolves to whichever commits last.
pub trait AccessGrantStore: Send + Sync {
    /// Create a grant. Granting an existing pair returns the stored record.
    fn grant(&self, user_id: UserId, media_id: MediaId, granted_by: UserId)
        -> Result<AccessGrant>;

    /// Remove a grant. Revoking a missing grant succeeds.
    fn revoke(&self, user_id: UserId, media_id: MediaId) -> Result<()>;

    /// Whether the pair is currently granted. Sits on the issuance hot path.
    fn check(&self, user_id: UserId, media_id: MediaId) -> Result<bool>;

    fn list_for_user(&self, user_id: UserId) -> Result<BTreeSet<MediaId>>;

    fn list_for_media(&self, media_id: MediaId) -> Result<BTreeSet<UserId>>;
}

/// SQLite-backed grant store. Emits audit events for changes that actually
/// touched a row.
#[derive(Clone)]
pub struct SqliteGrantStore {
    pool: DbPool,
    events: Arc<EventBus>,
}

impl SqliteGrantStore {
    pub fn new(pool: DbPool, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }
}

impl AccessGrantStore for SqliteGrantStore {
    fn grant(
        &self,
        user_id: UserId,
        media_id: MediaId,
        granted_by: UserId,
    ) -> Result<AccessGrant> {
        let conn = get_conn(&self.pool)?;
        let (grant, created) = grants::grant(&conn, user_id, media_id, granted_by)?;
        if created {
            tracing::info!(%user_id, %media_id, %granted_by, "Access granted");
            self.events.emit(AuditPayload::GrantCreated {
                user_id,
                media_id,
                granted_by,
            });
        } else {
            tracing::debug!(%user_id, %media_id, "Grant already present");
        }
        Ok(grant)
    }

    fn revoke(&self, user_id: UserId, media_id: MediaId) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        if grants::revoke(&conn, user_id, media_id)? {
            tracing::info!(%user_id, %media_id, "Access revoked");
            self.events
                .emit(AuditPayload::GrantRevoked { user_id, media_id });
        }
        Ok(())
    }

    fn check(&self, user_id: UserId, media_id: MediaId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        grants::check(&conn, user_id, media_id)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<BTreeSet<MediaId>> {
        let conn = get_conn(&self.pool)?;
        grants::list_for_user(&conn, user_id)
    }

    fn list_for_media(&self, media_id: MediaId) -> Result<BTreeSet<UserId>> {
        let conn = get_conn(&self.pool)?;
        grants::list_for_media(&conn, media_id)
    }
}
