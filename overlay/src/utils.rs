//! Color conversion helpers

use tiny_skia::Color;

use crate::view::PaintColor;

/// Convert [u8; 4] RGBA array to tiny_skia Color
#[inline]
pub fn color_from_rgba(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Convert an RGB triple plus float alpha, clamping alpha into [0, 1]
#[inline]
pub fn color_from_paint(color: PaintColor) -> Color {
    let alpha = if color.alpha.is_nan() {
        1.0
    } else {
        color.alpha.clamp(0.0, 1.0)
    };
    let [r, g, b] = color.rgb;
    color_from_rgba([r, g, b, (alpha * 255.0).round() as u8])
}
