//! Security audit events.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel with a bounded
//! ring-buffer of recent events so that the admin audit view can show what
//! happened before it was opened. Events are emitted server-side only; the
//! viewer never reports on itself.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ids::{MediaId, UserId};
use crate::media::Role;

/// Maximum number of events retained in the ring buffer.
const MAX_RECENT_EVENTS: usize = 500;

// ---------------------------------------------------------------------------
// AuditPayload
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditPayload {
    // -- Token lifecycle -----------------------------------------------------
    TokenIssued {
        user_id: UserId,
        media_id: MediaId,
        role: Role,
        expires_at: DateTime<Utc>,
    },
    AccessDenied {
        user_id: UserId,
        media_id: MediaId,
        reason: String,
    },
    TokenExpired {
        user_id: UserId,
        media_id: MediaId,
        expired_at: DateTime<Utc>,
    },
    TokenRejected {
        reason: String,
    },

    // -- Grant lifecycle -----------------------------------------------------
    GrantCreated {
        user_id: UserId,
        media_id: MediaId,
        granted_by: UserId,
    },
    GrantRevoked {
        user_id: UserId,
        media_id: MediaId,
    },
}

impl AuditPayload {
    /// Stable short name, used as a tracing field and in filters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenIssued { .. } => "issued",
            Self::AccessDenied { .. } => "denied",
            Self::TokenExpired { .. } => "expired",
            Self::TokenRejected { .. } => "rejected",
            Self::GrantCreated { .. } => "grant_created",
            Self::GrantRevoked { .. } => "grant_revoked",
        }
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// A timestamped audit event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: AuditPayload,
}

impl AuditEvent {
    /// Create a new event with a fresh UUID and the current timestamp.
    pub fn new(payload: AuditPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel with a bounded ring buffer of recent events.
pub struct EventBus {
    tx: broadcast::Sender<AuditEvent>,
    recent: RwLock<VecDeque<AuditEvent>>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_EVENTS`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_EVENTS)),
        }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers and store it in the
    /// ring buffer.
    pub fn emit(&self, payload: AuditPayload) {
        let event = AuditEvent::new(payload);

        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_EVENTS {
                recent.pop_back();
            }
            recent.push_front(event.clone());
        }

        // Ignore send errors (no subscribers).
        let _ = self.tx.send(event);
    }

    /// Return the `n` most recent events (newest first).
    pub fn recent_events(&self, n: usize) -> Vec<AuditEvent> {
        let recent = self.recent.read();
        recent.iter().take(n).cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
