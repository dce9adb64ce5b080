//! Token-gated byte-range streaming.
//!
//! Each request runs `Received -> Validated -> (RangeParsed | FullBody) ->
//! Streaming -> Completed | Aborted`. Nothing outlives the request except
//! the in-flight counter.

pub mod range;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use sv_access::{StreamClaims, StreamTokenService};
use sv_core::config::StorageConfig;
use sv_core::{Error, MediaId, Result};
use sv_db::pool::DbPool;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use self::range::{parse_range, resolve_content_type, ByteRange};

pub static X_ROLE: HeaderName = HeaderName::from_static("x-role");
pub static X_WATERMARK_REQUIRED: HeaderName = HeaderName::from_static("x-watermark-required");

/// Redeems stream tokens for file bytes.
pub struct StreamGateway {
    tokens: StreamTokenService,
    db: DbPool,
    storage: StorageConfig,
    chunk_size: usize,
    transfers: Arc<TransferCounters>,
}

/// How response bodies have ended so far.
#[derive(Debug, Default)]
struct TransferCounters {
    in_flight: AtomicUsize,
    completed: AtomicU64,
    aborted: AtomicU64,
}

/// Snapshot of [`StreamGateway`] transfer outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub in_flight: usize,
    pub completed: u64,
    pub aborted: u64,
}

/// A validated request, resolved to a file on disk.
struct Target {
    claims: StreamClaims,
    path: PathBuf,
    size: u64,
    content_type: String,
}

impl StreamGateway {
    pub fn new(
        tokens: StreamTokenService,
        db: DbPool,
        storage: StorageConfig,
        chunk_size: usize,
    ) -> Self {
        Self {
            tokens,
            db,
            storage,
            chunk_size: chunk_size.max(1),
            transfers: Arc::default(),
        }
    }

    /// Number of response bodies currently streaming.
    pub fn in_flight(&self) -> usize {
        self.transfers.in_flight.load(Ordering::Relaxed)
    }

    pub fn transfer_stats(&self) -> TransferStats {
        TransferStats {
            in_flight: self.in_flight(),
            completed: self.transfers.completed.load(Ordering::Relaxed),
            aborted: self.transfers.aborted.load(Ordering::Relaxed),
        }
    }

    /// Validate `token`, then serve the file (or the window `range` asks for).
    ///
    /// A `Range` header that is present but not visible ASCII is treated like
    /// any other malformed range.
    pub async fn handle_request(
        &self,
        token: &str,
        range: Option<&HeaderValue>,
    ) -> Result<Response> {
        let claims = self.tokens.validate(token)?;
        let target = self.resolve(claims).await?;

        let window = match range {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| Error::RangeNotSatisfiable { size: target.size })?;
                Some(parse_range(value, target.size)?)
            }
            None => None,
        };

        self.serve(target, window).await
    }

    async fn resolve(&self, claims: StreamClaims) -> Result<Target> {
        let media = {
            let conn = sv_db::pool::get_conn(&self.db)?;
            sv_db::queries::media::get_media(&conn, claims.media_id)?
        }
        .ok_or_else(|| Error::not_found("media", claims.media_id))?;

        let path = self
            .storage
            .resolve(&media.storage_path)
            .ok_or_else(|| Error::not_found("media file", claims.media_id))?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|_| Error::not_found("media file", claims.media_id))?;
        if !metadata.is_file() {
            return Err(Error::not_found("media file", claims.media_id));
        }

        let content_type = resolve_content_type(
            media.content_type.as_deref(),
            &media.storage_path,
            media.kind,
        );

        Ok(Target {
            claims,
            path,
            size: metadata.len(),
            content_type,
        })
    }

    async fn serve(&self, target: Target, window: Option<ByteRange>) -> Result<Response> {
        let mut file = tokio::fs::File::open(&target.path)
            .await
            .map_err(|_| Error::not_found("media file", target.claims.media_id))?;

        let (status, start, length) = match window {
            Some(r) => (StatusCode::PARTIAL_CONTENT, r.start, r.len()),
            None => (StatusCode::OK, 0, target.size),
        };
        if start > 0 {
            file.seek(std::io::SeekFrom::Start(start)).await?;
        }

        tracing::debug!(
            media_id = %target.claims.media_id,
            user_id = %target.claims.user_id,
            status = status.as_u16(),
            start,
            length,
            size = target.size,
            "Streaming media"
        );

        let guard = TransferGuard::start(self.transfers.clone(), target.claims.media_id, length);
        let reader = ReaderStream::with_capacity(file.take(length), self.chunk_size);
        let body = Body::from_stream(transfer(reader, guard));

        let watermark = if target.claims.role.is_admin() {
            "false"
        } else {
            "true"
        };

        let mut builder = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, target.content_type.as_str())
            .header(header::CONTENT_LENGTH, length)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CACHE_CONTROL, "no-store, private")
            .header(header::CONTENT_DISPOSITION, "inline")
            .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
            // Documents are framed by the viewer page on this origin.
            .header(header::X_FRAME_OPTIONS, "SAMEORIGIN")
            .header(header::CONTENT_SECURITY_POLICY, "frame-ancestors 'self'")
            .header(&X_ROLE, target.claims.role.as_str())
            .header(&X_WATERMARK_REQUIRED, HeaderValue::from_static(watermark));
        if let Some(r) = window {
            builder = builder.header(header::CONTENT_RANGE, r.content_range(target.size));
        }

        builder
            .body(body)
            .map_err(|e| Error::Internal(format!("Failed to build stream response: {e}")))
    }
}

/// Wrap `reader` so the guard lives exactly as long as the body.
fn transfer(
    mut reader: ReaderStream<tokio::io::Take<tokio::fs::File>>,
    guard: TransferGuard,
) -> impl futures::Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    async_stream::stream! {
        // Rebind so the block owns the whole guard, not copies of its fields.
        let mut guard = guard;
        while let Some(chunk) = reader.next().await {
            match chunk {
                Ok(bytes) => {
                    guard.sent += bytes.len() as u64;
                    yield Ok(bytes);
                }
                Err(e) => {
                    tracing::warn!(media_id = %guard.media_id, error = %e, "Read failed mid-stream");
                    yield Err(e);
                    return;
                }
            }
        }
        guard.completed = true;
    }
}

/// Counts a body as in flight and records how it ended when dropped.
struct TransferGuard {
    counters: Arc<TransferCounters>,
    media_id: MediaId,
    expected: u64,
    sent: u64,
    completed: bool,
}

impl TransferGuard {
    fn start(counters: Arc<TransferCounters>, media_id: MediaId, expected: u64) -> Self {
        counters.in_flight.fetch_add(1, Ordering::Relaxed);
        Self {
            counters,
            media_id,
            expected,
            sent: 0,
            completed: false,
        }
    }
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);
        if self.completed {
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(media_id = %self.media_id, bytes = self.sent, "Stream completed");
        } else {
            self.counters.aborted.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                media_id = %self.media_id,
                sent = self.sent,
                expected = self.expected,
                "Stream aborted"
            );
        }
    }
}
