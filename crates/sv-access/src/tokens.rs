//! Stream token issuance and validation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sv_core::config::{ServerConfig, StreamingConfig};
use sv_core::events::{AuditPayload, EventBus};
use sv_core::{Error, MediaId, MediaKind, Result, Role, UserId};
use sv_db::pool::{get_conn, DbPool};
use sv_db::queries::{media, users};

use crate::codec::{StreamClaims, TokenCodec};
use crate::grants::AccessGrantStore;
use crate::{PLAYBACK_ROUTE, STREAM_ROUTE};

/// Timing and addressing knobs for issued tokens.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub ttl: Duration,
    /// Tolerance for `issued_at` lying in the future. Never applied to
    /// `expires_at`.
    pub clock_skew: Duration,
    /// Prefix for generated URLs; empty yields host-relative URLs.
    pub public_base_url: String,
}

impl TokenSettings {
    pub fn from_config(streaming: &StreamingConfig, server: &ServerConfig) -> Self {
        Self {
            ttl: Duration::seconds(streaming.effective_ttl_secs() as i64),
            clock_skew: Duration::seconds(streaming.clock_skew_secs as i64),
            public_base_url: server.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self::from_config(&StreamingConfig::default(), &ServerConfig::default())
    }
}

/// Issuance response handed to the viewer.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedStream {
    pub stream_url: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
    pub watermark_required: bool,
    pub role: Role,
    pub allow_fullscreen: bool,
    /// Poster path, returned as stored in the catalog.
    pub thumbnail: Option<String>,
    pub media_kind: MediaKind,
    pub title: String,
    pub watermark_label: String,
    pub refresh_url: String,
    #[serde(skip)]
    pub claims: Option<StreamClaims>,
}

/// Mints and checks short-lived stream tokens.
///
/// Issuance performs the only grant lookup; a minted token stays valid
/// until `expires_at` even if the grant is revoked in the meantime.
#[derive(Clone)]
pub struct StreamTokenService {
    codec: TokenCodec,
    settings: TokenSettings,
    pool: DbPool,
    grants: Arc<dyn AccessGrantStore>,
    events: Arc<EventBus>,
}

impl StreamTokenService {
    pub fn new(
        codec: TokenCodec,
        settings: TokenSettings,
        pool: DbPool,
        grants: Arc<dyn AccessGrantStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            codec,
            settings,
            pool,
            grants,
            events,
        }
    }

    /// Build from configuration. Without a configured secret a random one is
    /// generated, so tokens will not survive a restart.
    pub fn from_config(
        streaming: &StreamingConfig,
        server: &ServerConfig,
        pool: DbPool,
        grants: Arc<dyn AccessGrantStore>,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let codec = match streaming.token_secret.as_deref() {
            Some(secret) if !secret.is_empty() => TokenCodec::new(secret.as_bytes())?,
            _ => {
                tracing::warn!(
                    "No streaming.token_secret configured; using an ephemeral secret. \
                     Issued tokens will not survive a restart."
                );
                TokenCodec::random()?
            }
        };
        Ok(Self::new(
            codec,
            TokenSettings::from_config(streaming, server),
            pool,
            grants,
            events,
        ))
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn issue(&self, user_id: UserId, media_id: MediaId) -> Result<IssuedStream> {
        self.issue_at(user_id, media_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        media_id: MediaId,
        now: DateTime<Utc>,
    ) -> Result<IssuedStream> {
        let conn = get_conn(&self.pool)?;
        let user = users::get_user_by_id(&conn, user_id)?
            .ok_or_else(|| Error::not_found("user", user_id))?;

        if !user.role.is_admin() && !self.grants.check(user_id, media_id)? {
            tracing::info!(%user_id, %media_id, "Stream issuance denied: no grant");
            self.events.emit(AuditPayload::AccessDenied {
                user_id,
                media_id,
                reason: "no active grant".into(),
            });
            return Err(Error::Forbidden(format!(
                "user {user_id} has no access to media {media_id}"
            )));
        }

        let item = media::get_media(&conn, media_id)?
            .ok_or_else(|| Error::not_found("media", media_id))?;

        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let claims = StreamClaims {
            media_id,
            user_id,
            role: user.role,
            issued_at,
            expires_at: issued_at + self.settings.ttl,
        };
        let token = self.codec.encode(&claims);
        let base = &self.settings.public_base_url;
        let watermark_required = !user.role.is_admin();

        tracing::info!(
            %user_id,
            %media_id,
            role = %user.role,
            expires_at = %claims.expires_at,
            "Stream token issued"
        );
        self.events.emit(AuditPayload::TokenIssued {
            user_id,
            media_id,
            role: user.role,
            expires_at: claims.expires_at,
        });

        Ok(IssuedStream {
            stream_url: format!("{base}{STREAM_ROUTE}/{token}"),
            expires_at: claims.expires_at,
            watermark_required,
            role: user.role,
            allow_fullscreen: user.role.is_admin(),
            thumbnail: item.thumbnail,
            media_kind: item.kind,
            title: item.title,
            watermark_label: watermark_label(&user.username, user_id),
            refresh_url: format!("{base}{PLAYBACK_ROUTE}/{media_id}"),
            claims: Some(claims),
        })
    }

    pub fn validate(&self, token: &str) -> Result<StreamClaims> {
        self.validate_at(token, Utc::now())
    }

    /// Validate `token` as if the current time were `now`.
    ///
    /// Signature problems are reported as [`Error::InvalidToken`] and logged
    /// as possible tampering. Expiry is routine and logged at debug.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<StreamClaims> {
        let claims = match self.codec.decode(token) {
            Ok(c) => c,
            Err(e) => return Err(self.reject(&e.to_string())),
        };

        if now > claims.expires_at {
            tracing::debug!(
                user_id = %claims.user_id,
                media_id = %claims.media_id,
                expires_at = %claims.expires_at,
                "Stream token expired"
            );
            self.events.emit(AuditPayload::TokenExpired {
                user_id: claims.user_id,
                media_id: claims.media_id,
                expired_at: claims.expires_at,
            });
            return Err(Error::TokenExpired);
        }

        if claims.issued_at > now + self.settings.clock_skew {
            return Err(self.reject("issued in the future"));
        }

        Ok(claims)
    }

    fn reject(&self, reason: &str) -> Error {
        tracing::warn!(reason, "Rejected stream token (possible tampering)");
        self.events.emit(AuditPayload::TokenRejected {
            reason: reason.to_string(),
        });
        Error::InvalidToken(reason.to_string())
    }
}

/// Text burned into the watermark: who is watching.
fn watermark_label(username: &str, user_id: UserId) -> String {
    let id = user_id.to_string();
    format!("{username} #{}", &id[..8])
}
