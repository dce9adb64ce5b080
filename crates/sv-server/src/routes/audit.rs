//! Security audit feed: recent events and a live Server-Sent Events stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use sv_core::events::AuditEvent;

use crate::context::AppContext;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Maximum events to return, newest first.
    pub limit: Option<usize>,
    /// Only events of this kind (`issued`, `denied`, `expired`, `rejected`,
    /// `grant_created`, `grant_revoked`).
    pub kind: Option<String>,
}

impl AuditQuery {
    fn matches(&self, event: &AuditEvent) -> bool {
        self.kind
            .as_deref()
            .map_or(true, |k| k == event.payload.kind())
    }
}

/// GET /api/admin/audit
#[utoipa::path(
    get,
    path = "/api/admin/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Recent audit events, newest first"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn recent_events(
    State(ctx): State<AppContext>,
    Query(params): Query<AuditQuery>,
) -> Json<Vec<AuditEvent>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let events = ctx
        .event_bus
        .recent_events(MAX_LIMIT)
        .into_iter()
        .filter(|e| params.matches(e))
        .take(limit)
        .collect();
    Json(events)
}

/// GET /api/admin/audit/stream -- SSE feed of audit events.
///
/// Replays recent events (oldest first) for late joiners, then follows the
/// bus.
pub async fn event_stream(
    State(ctx): State<AppContext>,
    Query(params): Query<AuditQuery>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let replay = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let recent = ctx.event_bus.recent_events(replay);
    let mut rx = ctx.event_bus.subscribe();

    let stream = async_stream::stream! {
        for event in recent.into_iter().rev() {
            if params.matches(&event) {
                if let Ok(data) = serde_json::to_string(&event) {
                    yield Ok(Event::default().event(event.payload.kind()).data(data));
                }
            }
        }

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if params.matches(&event) {
                        if let Ok(data) = serde_json::to_string(&event) {
                            yield Ok(Event::default().event(event.payload.kind()).data(data));
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("Audit stream client lagged by {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
