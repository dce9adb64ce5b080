//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temp media root,
//! a fixed token secret and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use sv_access::AccessGrantStore;
use sv_core::config::Config;
use sv_core::{MediaId, MediaKind, Role, UserId};
use sv_db::pool::{init_memory_pool, DbPool};
use sv_db::queries::media::NewMedia;
use sv_server::context::AppContext;
use sv_server::router::build_router;

/// Size of the file behind [`TestHarness::add_video`].
pub const VIDEO_LEN: usize = 1000;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub media_dir: tempfile::TempDir,
}

/// Deterministic content so range tests can check exact bytes.
pub fn video_bytes() -> Vec<u8> {
    (0..VIDEO_LEN).map(|i| (i % 251) as u8).collect()
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.streaming.token_secret = Some("integration-test-secret-0123456789abcdef".into());
    config
}

impl TestHarness {
    /// Create a new harness with the test configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a new harness with a custom configuration. The media root is
    /// always replaced by a fresh temp directory.
    pub fn with_config(mut config: Config) -> Self {
        let media_dir = tempfile::tempdir().expect("failed to create media dir");
        config.storage.media_root = media_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone()).expect("failed to build context");

        Self { ctx, db, media_dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(test_config()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> sv_db::pool::PooledConnection {
        sv_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create a user whose password is `password` (cheap bcrypt cost).
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> UserId {
        let hash = bcrypt::hash(password, 4).expect("bcrypt failed");
        sv_db::queries::users::create_user(&self.conn(), username, &hash, role)
            .expect("failed to create user")
            .id
    }

    /// Insert a session row directly and return its token.
    pub fn session(&self, user_id: UserId) -> String {
        let token = format!("session-{}", uuid::Uuid::new_v4().simple());
        let expires = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        sv_db::queries::auth::create_token(&self.conn(), user_id, &token, &expires)
            .expect("failed to create session");
        token
    }

    /// Write `bytes` under the media root and catalog it.
    pub fn add_media(&self, title: &str, kind: MediaKind, file: &str, bytes: &[u8]) -> MediaId {
        std::fs::write(self.media_dir.path().join(file), bytes).expect("failed to write media");
        sv_db::queries::media::create_media(
            &self.conn(),
            &NewMedia {
                title,
                kind,
                storage_path: file,
                content_type: None,
                thumbnail: Some("posters/default.jpg"),
            },
        )
        .expect("failed to create media")
        .id
    }

    /// A 1000-byte `.mp4` catalogued as video.
    pub fn add_video(&self, title: &str) -> MediaId {
        self.add_media(title, MediaKind::Video, "clip.mp4", &video_bytes())
    }

    pub fn grant(&self, user_id: UserId, media_id: MediaId, by: UserId) {
        self.ctx
            .grants
            .grant(user_id, media_id, by)
            .expect("failed to grant");
    }
}

/// Token segment of a stream URL.
pub fn token_of(stream_url: &str) -> String {
    stream_url
        .rsplit('/')
        .next()
        .expect("stream url has a token")
        .to_string()
}

/// `Authorization` header value for a session token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
