//! Which anti-extraction measures a page installs.
//!
//! The plan is computed server-side and shipped to the page as a list of
//! names. The script installs each one in isolation, so a browser that
//! rejects one measure still gets the rest.

use serde::Serialize;

use crate::config::ViewerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    /// Patch `requestFullscreen` to reject and force-exit on `fullscreenchange`.
    Fullscreen,
    /// F11, `f`, Ctrl/Meta+Shift+F.
    FullscreenKeys,
    /// Ctrl/Meta+S, Ctrl/Meta+P, PrintScreen, Meta+Shift+3/4/5.
    CaptureKeys,
    ContextMenu,
    Drag,
    Copy,
    Selection,
    /// `controlsList` and `disablePictureInPicture` on video elements.
    MediaControls,
    Watermark,
}

impl Restriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fullscreen => "fullscreen",
            Self::FullscreenKeys => "fullscreen_keys",
            Self::CaptureKeys => "capture_keys",
            Self::ContextMenu => "context_menu",
            Self::Drag => "drag",
            Self::Copy => "copy",
            Self::Selection => "selection",
            Self::MediaControls => "media_controls",
            Self::Watermark => "watermark",
        }
    }
}

/// Ordered set of restrictions for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RestrictionPlan(Vec<Restriction>);

impl RestrictionPlan {
    /// Extraction deterrents apply to every role. Fullscreen blocking and the
    /// watermark follow the issuance directives.
    pub fn for_config(config: &ViewerConfig) -> Self {
        let mut plan = vec![
            Restriction::CaptureKeys,
            Restriction::ContextMenu,
            Restriction::Drag,
            Restriction::Copy,
            Restriction::Selection,
            Restriction::MediaControls,
        ];
        if !config.allow_fullscreen {
            plan.push(Restriction::Fullscreen);
            plan.push(Restriction::FullscreenKeys);
        }
        if config.watermark_required {
            plan.push(Restriction::Watermark);
        }
        plan.sort();
        Self(plan)
    }

    pub fn contains(&self, r: Restriction) -> bool {
        self.0.contains(&r)
    }

    pub fn iter(&self) -> impl Iterator<Item = Restriction> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
