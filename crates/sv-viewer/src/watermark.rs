//! Tiled identifying overlay.

use base64::{engine::general_purpose::STANDARD, Engine};
use sv_core::config::WatermarkSettings;

use crate::html::escape_html;

/// One SVG tile with the viewer's label, repeated across the playback area
/// as a CSS background.
#[derive(Debug, Clone)]
pub struct Watermark {
    label: String,
    settings: WatermarkSettings,
}

impl Watermark {
    pub fn new(label: impl Into<String>, settings: &WatermarkSettings) -> Self {
        Self {
            label: label.into(),
            settings: settings.clone(),
        }
    }

    /// Overlay opacity, clamped to `0.0..=1.0`.
    pub fn opacity(&self) -> f32 {
        self.settings.opacity.clamp(0.0, 1.0)
    }

    pub fn svg(&self) -> String {
        let w = self.settings.tile_width.max(1);
        let h = self.settings.tile_height.max(1);
        let (cx, cy) = (w / 2, h / 2);
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<text x="{cx}" y="{cy}" text-anchor="middle" dominant-baseline="middle" "#,
                r##"font-family="sans-serif" font-size="{font}" fill="#7f7f7f" "##,
                r#"transform="rotate({angle} {cx} {cy})">{label}</text></svg>"#
            ),
            w = w,
            h = h,
            cx = cx,
            cy = cy,
            font = self.settings.font_px.max(1),
            angle = self.settings.angle_deg,
            label = escape_html(&self.label),
        )
    }

    /// `data:` URI suitable for `background-image`.
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.svg()))
    }
}
