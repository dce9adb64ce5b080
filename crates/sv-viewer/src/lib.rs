//! sv-viewer: the browser-side playback surface.
//!
//! A [`ViewerShell`] turns one issuance response into an HTML page whose
//! script installs the restriction plan (fullscreen, shortcut, context
//! menu, drag, copy and selection blocking), tiles the watermark and keeps
//! the token fresh. Policy comes only from the explicit [`ViewerConfig`].

pub mod config;
pub mod html;
pub mod refresh;
pub mod restrictions;
pub mod shell;
pub mod watermark;

pub use config::ViewerConfig;
pub use refresh::RefreshSchedule;
pub use restrictions::{Restriction, RestrictionPlan};
pub use shell::{content_security_policy, shell_for, InlineShell, IsolatedShell, ViewerPage, ViewerShell};
pub use watermark::Watermark;
