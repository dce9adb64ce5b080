//! Per-issuance viewer configuration.

use sv_access::IssuedStream;
use sv_core::config::{ViewerMode, ViewerSettings, WatermarkSettings};
use sv_core::Role;

/// Everything the shell needs to decide how to lock the page down.
///
/// Built once per issuance from the issuance response and server settings.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub role: Role,
    pub watermark_required: bool,
    pub allow_fullscreen: bool,
    pub mode: ViewerMode,
    pub watermark: WatermarkSettings,
    pub refresh_margin_secs: u64,
}

impl ViewerConfig {
    pub fn for_issuance(issued: &IssuedStream, settings: &ViewerSettings) -> Self {
        Self {
            role: issued.role,
            watermark_required: issued.watermark_required,
            allow_fullscreen: issued.allow_fullscreen,
            mode: settings.mode,
            watermark: settings.watermark.clone(),
            refresh_margin_secs: settings.refresh_margin_secs,
        }
    }
}
