//! Crosshair settings
//!
//! The serialized shape is a flat JSON object. Every key is optional on load;
//! missing keys take the value from [`Settings::default`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the crosshair is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrosshairMode {
    /// Four arms around the center, optionally with a center dot
    #[default]
    Cross,
    /// A single filled dot
    Dot,
}

impl CrosshairMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrosshairMode::Cross => "cross",
            CrosshairMode::Dot => "dot",
        }
    }
}

impl fmt::Display for CrosshairMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrosshairMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cross" => Ok(CrosshairMode::Cross),
            "dot" => Ok(CrosshairMode::Dot),
            other => Err(format!("unknown crosshair mode '{other}'")),
        }
    }
}

/// Ranges exposed by the control surface.
///
/// The core never validates against these; the collaborator that mutates
/// settings clamps before submitting (see [`crate::SettingsUpdate::clamped`]).
pub mod limits {
    use std::ops::RangeInclusive;

    pub const ALPHA: RangeInclusive<f32> = 0.10..=1.0;
    pub const THICKNESS: RangeInclusive<u32> = 1..=20;
    pub const LENGTH: RangeInclusive<u32> = 1..=300;
    pub const GAP: RangeInclusive<u32> = 0..=100;
    pub const DOT_SIZE: RangeInclusive<u32> = 1..=50;
}

/// Full crosshair configuration, persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: CrosshairMode,
    /// RGB, serialized as `[r, g, b]`
    pub color: [u8; 3],
    /// Opacity in `[0, 1]`
    pub alpha: f32,
    /// Pen width in pixels
    pub thickness: u32,
    /// Arm length in pixels
    pub length: u32,
    /// Distance from the center to where each arm starts
    pub gap: u32,
    /// Diameter of the dot in pixels
    pub dot_size: u32,
    pub show_center_dot: bool,
    /// Whether pointer input should pass through the overlay
    pub click_through: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: CrosshairMode::Cross,
            color: [255, 255, 255],
            alpha: 1.0,
            thickness: 1,
            length: 1,
            gap: 0,
            dot_size: 6,
            show_center_dot: false,
            click_through: false,
        }
    }
}

impl Settings {
    /// Snapshot of everything that affects drawing
    pub fn render_state(&self) -> RenderState {
        RenderState {
            mode: self.mode,
            color: self.color,
            alpha: self.alpha,
            thickness: self.thickness,
            length: self.length,
            gap: self.gap,
            dot_size: self.dot_size,
            show_center_dot: self.show_center_dot,
        }
    }
}

/// Immutable drawing parameters for one paint pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub mode: CrosshairMode,
    pub color: [u8; 3],
    pub alpha: f32,
    pub thickness: u32,
    pub length: u32,
    pub gap: u32,
    pub dot_size: u32,
    pub show_center_dot: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Settings::default().render_state()
    }
}
