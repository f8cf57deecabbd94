//! Settings mutations
//!
//! The console and the hotkey listener never touch [`Settings`] directly.
//! They build a [`SettingsUpdate`] and hand it to the overlay thread, which
//! applies it to the one settings instance it owns.

use crate::settings::{CrosshairMode, Settings, limits};

/// A single change to the crosshair settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsUpdate {
    Mode(CrosshairMode),
    Color([u8; 3]),
    Alpha(f32),
    Thickness(u32),
    Length(u32),
    Gap(u32),
    DotSize(u32),
    ShowCenterDot(bool),
    ClickThrough(bool),
    /// Flip `click_through` relative to the value at the time of application
    ToggleClickThrough,
}

/// What an applied update changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateEffect {
    /// A drawing parameter changed; the overlay needs a repaint
    pub repaint: bool,
    /// `click_through` changed; the window style needs reconciling
    pub click_through_changed: bool,
}

impl SettingsUpdate {
    /// Clamp the carried value to the range the control surface exposes
    pub fn clamped(self) -> Self {
        match self {
            SettingsUpdate::Alpha(v) => {
                let v = if v.is_nan() { *limits::ALPHA.end() } else { v };
                SettingsUpdate::Alpha(v.clamp(*limits::ALPHA.start(), *limits::ALPHA.end()))
            }
            SettingsUpdate::Thickness(v) => SettingsUpdate::Thickness(clamp_u32(v, &limits::THICKNESS)),
            SettingsUpdate::Length(v) => SettingsUpdate::Length(clamp_u32(v, &limits::LENGTH)),
            SettingsUpdate::Gap(v) => SettingsUpdate::Gap(clamp_u32(v, &limits::GAP)),
            SettingsUpdate::DotSize(v) => SettingsUpdate::DotSize(clamp_u32(v, &limits::DOT_SIZE)),
            other => other,
        }
    }
}

fn clamp_u32(value: u32, range: &std::ops::RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

impl Settings {
    /// Apply an update in place and report what changed
    pub fn apply(&mut self, update: SettingsUpdate) -> UpdateEffect {
        let render_before = self.render_state();
        let click_through_before = self.click_through;

        match update {
            SettingsUpdate::Mode(mode) => self.mode = mode,
            SettingsUpdate::Color(color) => self.color = color,
            SettingsUpdate::Alpha(alpha) => self.alpha = alpha,
            SettingsUpdate::Thickness(thickness) => self.thickness = thickness,
            SettingsUpdate::Length(length) => self.length = length,
            SettingsUpdate::Gap(gap) => self.gap = gap,
            SettingsUpdate::DotSize(size) => self.dot_size = size,
            SettingsUpdate::ShowCenterDot(show) => self.show_center_dot = show,
            SettingsUpdate::ClickThrough(enabled) => self.click_through = enabled,
            SettingsUpdate::ToggleClickThrough => self.click_through = !self.click_through,
        }

        UpdateEffect {
            repaint: self.render_state() != render_before,
            click_through_changed: self.click_through != click_through_before,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_update_requests_repaint() {
        let mut settings = Settings::default();
        let effect = settings.apply(SettingsUpdate::Length(12));

        assert_eq!(settings.length, 12);
        assert!(effect.repaint);
        assert!(!effect.click_through_changed);
    }

    #[test]
    fn test_unchanged_value_is_a_noop() {
        let mut settings = Settings::default();
        let effect = settings.apply(SettingsUpdate::Gap(0));
        assert_eq!(effect, UpdateEffect::default());
    }

    #[test]
    fn test_toggle_click_through() {
        let mut settings = Settings::default();

        let effect = settings.apply(SettingsUpdate::ToggleClickThrough);
        assert!(settings.click_through);
        assert!(effect.click_through_changed);
        assert!(!effect.repaint);

        settings.apply(SettingsUpdate::ToggleClickThrough);
        assert!(!settings.click_through);
    }

    #[test]
    fn test_clamped_respects_ui_ranges() {
        assert_eq!(SettingsUpdate::Alpha(0.0).clamped(), SettingsUpdate::Alpha(0.10));
        assert_eq!(SettingsUpdate::Alpha(3.0).clamped(), SettingsUpdate::Alpha(1.0));
        assert_eq!(SettingsUpdate::Thickness(0).clamped(), SettingsUpdate::Thickness(1));
        assert_eq!(SettingsUpdate::Length(1000).clamped(), SettingsUpdate::Length(300));
        assert_eq!(SettingsUpdate::Gap(101).clamped(), SettingsUpdate::Gap(100));
        assert_eq!(SettingsUpdate::DotSize(0).clamped(), SettingsUpdate::DotSize(1));
        assert_eq!(
            SettingsUpdate::ClickThrough(true).clamped(),
            SettingsUpdate::ClickThrough(true)
        );
    }
}
