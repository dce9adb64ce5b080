//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, auth, token streaming, byte storage and the
//! viewer. Every section defaults sensibly so a completely empty `{}` file is
//! valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Shortest token lifetime accepted without a warning.
pub const MIN_TOKEN_TTL_SECS: u64 = 30;
/// Longest token lifetime accepted without a warning.
pub const MAX_TOKEN_TTL_SECS: u64 = 3600;
/// Minimum secret length (bytes) for HMAC signing.
pub const MIN_SECRET_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub streaming: StreamingConfig,
    pub storage: StorageConfig,
    pub viewer: ViewerSettings,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        let ttl = self.streaming.token_ttl_secs;
        if !(MIN_TOKEN_TTL_SECS..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
            warnings.push(format!(
                "streaming.token_ttl_secs {ttl} is outside {MIN_TOKEN_TTL_SECS}..={MAX_TOKEN_TTL_SECS}; it will be clamped"
            ));
        }

        match self.streaming.token_secret {
            None => warnings.push(
                "streaming.token_secret is not set; a random secret will be generated and tokens will not survive restarts".into(),
            ),
            Some(ref s) if s.len() < MIN_SECRET_LEN => warnings.push(format!(
                "streaming.token_secret is shorter than {MIN_SECRET_LEN} bytes"
            )),
            Some(_) => {}
        }

        if self.viewer.refresh_margin_secs >= self.streaming.effective_ttl_secs() {
            warnings.push(
                "viewer.refresh_margin_secs is not shorter than the token TTL; the viewer will refresh continuously".into(),
            );
        }

        let opacity = self.viewer.watermark.opacity;
        if !(0.0..=1.0).contains(&opacity) {
            warnings.push(format!("viewer.watermark.opacity {opacity} is outside 0..=1"));
        }

        if self.streaming.chunk_size == 0 {
            warnings.push("streaming.chunk_size is 0; the default will be used".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Prefix for absolute stream URLs. Empty means URLs are origin-relative.
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/sealview.db"),
            public_base_url: String::new(),
        }
    }
}

/// Session authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(default = "default_session_timeout")]
    pub session_timeout_hours: u64,
    /// Login attempts allowed per minute across all clients.
    pub login_rate_per_minute: u32,
}

fn default_session_timeout() -> u64 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_hours: default_session_timeout(),
            login_rate_per_minute: 30,
        }
    }
}

/// Stream token and gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// HMAC secret for stream tokens. Generated at startup when absent.
    pub token_secret: Option<String>,
    pub token_ttl_secs: u64,
    /// Tolerance for tokens whose issue time is ahead of this node's clock.
    /// Never extends `expires_at`.
    pub clock_skew_secs: u64,
    /// Read buffer size for streamed bodies.
    pub chunk_size: usize,
    /// Token issuances allowed per minute across all clients.
    pub issue_rate_per_minute: u32,
}

impl StreamingConfig {
    /// TTL clamped into the accepted window.
    pub fn effective_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
            .clamp(MIN_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS)
    }

    /// Chunk size with the zero case replaced by the default.
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            64 * 1024
        } else {
            self.chunk_size
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: 300,
            clock_skew_secs: 30,
            chunk_size: 64 * 1024,
            issue_rate_per_minute: 600,
        }
    }
}

/// Raw byte store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Relative media storage paths are resolved against this directory.
    pub media_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("./data/media"),
        }
    }
}

impl StorageConfig {
    /// Resolve a stored location to a filesystem path.
    ///
    /// Returns `None` for relative paths that try to climb out of the root.
    pub fn resolve(&self, storage_path: &str) -> Option<PathBuf> {
        let path = Path::new(storage_path);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        if path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return None;
        }
        Some(self.media_root.join(path))
    }
}

/// Which viewer shell implementation serves the playback page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    /// Player rendered directly in the page.
    Inline,
    /// Player rendered inside a sandboxed frame the host page cannot reach.
    #[default]
    Isolated,
}

/// Viewer shell settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub mode: ViewerMode,
    /// Seconds before `expires_at` at which the viewer fetches a new token.
    pub refresh_margin_secs: u64,
    pub watermark: WatermarkSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            mode: ViewerMode::default(),
            refresh_margin_secs: 60,
            watermark: WatermarkSettings::default(),
        }
    }
}

/// Appearance of the tiled identifying overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub opacity: f32,
    pub angle_deg: f32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub font_px: u32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            opacity: 0.18,
            angle_deg: -30.0,
            tile_width: 280,
            tile_height: 160,
            font_px: 16,
        }
    }
}
