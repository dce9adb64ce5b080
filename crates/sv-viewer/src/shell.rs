//! Viewer shells: one page contract, two isolation strategies.

use chrono::Utc;
use serde::Serialize;
use sv_access::IssuedStream;
use sv_core::config::ViewerMode;
use sv_core::{MediaKind, Role};

use crate::config::ViewerConfig;
use crate::html::{escape_html, json_for_script};
use crate::refresh::RefreshSchedule;
use crate::restrictions::RestrictionPlan;
use crate::watermark::Watermark;

const RUNTIME_JS: &str = include_str!("../assets/viewer.js");
const VIEWER_CSS: &str = include_str!("../assets/viewer.css");

/// Data the page script boots from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Boot<'a> {
    stream_url: &'a str,
    refresh_url: &'a str,
    refresh_period_secs: u64,
    media_kind: MediaKind,
    title: &'a str,
    thumbnail: Option<&'a str>,
    role: Role,
    allow_fullscreen: bool,
    restrictions: RestrictionPlan,
    watermark: Option<BootWatermark>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BootWatermark {
    data_uri: String,
    opacity: f32,
}

/// One issuance, ready to render.
#[derive(Debug, Clone)]
pub struct ViewerPage<'a> {
    issued: &'a IssuedStream,
    config: &'a ViewerConfig,
    plan: RestrictionPlan,
    schedule: RefreshSchedule,
}

impl<'a> ViewerPage<'a> {
    pub fn new(issued: &'a IssuedStream, config: &'a ViewerConfig) -> Self {
        let issued_at = issued
            .claims
            .as_ref()
            .map(|c| c.issued_at)
            .unwrap_or_else(Utc::now);
        Self {
            issued,
            config,
            plan: RestrictionPlan::for_config(config),
            schedule: RefreshSchedule::new(
                issued_at,
                issued.expires_at,
                config.refresh_margin_secs,
            ),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.issued.media_kind
    }

    pub fn plan(&self) -> &RestrictionPlan {
        &self.plan
    }

    pub fn schedule(&self) -> &RefreshSchedule {
        &self.schedule
    }

    fn boot_json(&self) -> String {
        let watermark = self.config.watermark_required.then(|| {
            let wm = Watermark::new(&self.issued.watermark_label, &self.config.watermark);
            BootWatermark {
                data_uri: wm.data_uri(),
                opacity: wm.opacity(),
            }
        });
        let boot = Boot {
            stream_url: &self.issued.stream_url,
            refresh_url: &self.issued.refresh_url,
            refresh_period_secs: self.schedule.period_secs(),
            media_kind: self.issued.media_kind,
            title: &self.issued.title,
            thumbnail: self.issued.thumbnail.as_deref(),
            role: self.config.role,
            allow_fullscreen: self.config.allow_fullscreen,
            restrictions: self.plan.clone(),
            watermark,
        };
        // Only plain strings, numbers and enums: serialization cannot fail.
        json_for_script(&boot).unwrap_or_else(|_| "null".to_string())
    }

    /// Full HTML document running the shell runtime in the current
    /// browsing context. `source` selects how fresh tokens arrive:
    /// `"fetch"` polls the issuance endpoint, `"parent"` waits for the
    /// embedding page to post them.
    fn inline_document(&self, nonce: &str, source: &str) -> String {
        let body = format!(
            r#"<div id="sv-root" class="sv-root" aria-label="{title}"></div>
<script nonce="{nonce}">{RUNTIME_JS}</script>
<script nonce="{nonce}">SealView.mount(document.getElementById("sv-root"), {boot}, {{ source: "{source}" }});</script>"#,
            title = escape_html(&self.issued.title),
            nonce = escape_html(nonce),
            boot = self.boot_json(),
        );
        document(&self.issued.title, nonce, &body)
    }
}

fn document(title: &str, nonce: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="referrer" content="no-referrer">
<title>{title}</title>
<style nonce="{nonce}">{VIEWER_CSS}</style>
</head>
<body class="sv-body">
{body}
</body>
</html>
"#,
        title = escape_html(title),
        nonce = escape_html(nonce),
    )
}

/// A strategy for putting one [`ViewerPage`] in front of the user.
pub trait ViewerShell: Send + Sync {
    fn mode(&self) -> ViewerMode;

    /// Whether this shell can present `kind`.
    fn supports(&self, kind: MediaKind) -> bool;

    /// Render the complete HTML page. Every inline `<script>` and `<style>`
    /// carries `nonce` so the page can run under a nonce-based CSP.
    fn render(&self, page: &ViewerPage<'_>, nonce: &str) -> String;
}

/// Renders the player straight into the served page.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineShell;

impl ViewerShell for InlineShell {
    fn mode(&self) -> ViewerMode {
        ViewerMode::Inline
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    fn render(&self, page: &ViewerPage<'_>, nonce: &str) -> String {
        page.inline_document(nonce, "fetch")
    }
}

/// Renders the player inside a sandboxed `srcdoc` frame with an opaque
/// origin, so host-page script cannot reach into it. The host page keeps a
/// copy of the runtime and mounts inline if the frame never reports ready.
///
/// Browser PDF viewers do not load inside sandboxed frames, so document and
/// presentation kinds are left to [`InlineShell`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolatedShell;

/// Attribute value for the frame. `allow-same-origin` must never appear.
pub const FRAME_SANDBOX: &str = "allow-scripts";

impl ViewerShell for IsolatedShell {
    fn mode(&self) -> ViewerMode {
        ViewerMode::Isolated
    }

    fn supports(&self, kind: MediaKind) -> bool {
        matches!(kind, MediaKind::Video | MediaKind::Image)
    }

    fn render(&self, page: &ViewerPage<'_>, nonce: &str) -> String {
        let inner = page.inline_document(nonce, "parent");
        let inner_json = json_for_script(&inner).unwrap_or_else(|_| "\"\"".to_string());
        let body = format!(
            r#"<div id="sv-host" class="sv-root sv-host" data-sandbox="{sandbox}"></div>
<script nonce="{nonce}">{RUNTIME_JS}</script>
<script nonce="{nonce}">SealView.host(document.getElementById("sv-host"), {boot}, {inner_json}, "{sandbox}");</script>"#,
            sandbox = FRAME_SANDBOX,
            nonce = escape_html(nonce),
            boot = page.boot_json(),
        );
        document(&page.issued.title, nonce, &body)
    }
}

/// Pick the shell for `mode`, falling back to inline for kinds the
/// isolated shell cannot present.
pub fn shell_for(mode: ViewerMode, kind: MediaKind) -> Box<dyn ViewerShell> {
    match mode {
        ViewerMode::Isolated if IsolatedShell.supports(kind) => Box::new(IsolatedShell),
        _ => Box::new(InlineShell),
    }
}

/// `Content-Security-Policy` for a viewer page rendered with `nonce`.
///
/// `media_origin` is added to the fetch directives when streams are served
/// from a different origin than the page.
pub fn content_security_policy(nonce: &str, media_origin: Option<&str>) -> String {
    let extra = media_origin
        .filter(|o| !o.is_empty())
        .map(|o| format!(" {o}"))
        .unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'nonce-{nonce}'; \
         style-src 'nonce-{nonce}'; \
         img-src 'self' data:{extra}; \
         media-src 'self'{extra}; \
         frame-src 'self'{extra}; \
         connect-src 'self'; \
         base-uri 'none'; \
         form-action 'none'; \
         frame-ancestors 'self'"
    )
}
