//! Crosshair window
//!
//! Pairs a platform backend with the renderer and the view.

use crosshair_core::RenderState;

use crate::platform::{
    ExtendedStyle, NativeOverlay, OverlayPlatform, PlatformError, WindowStyleAccess,
};
use crate::renderer::Renderer;
use crate::view::compose;

/// A platform window with its own renderer
pub struct CrosshairWindow<P: OverlayPlatform = NativeOverlay> {
    platform: P,
    renderer: Renderer,
}

impl<P: OverlayPlatform> CrosshairWindow<P> {
    pub fn from_platform(platform: P) -> Self {
        Self {
            platform,
            renderer: Renderer::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.platform.width()
    }

    pub fn height(&self) -> u32 {
        self.platform.height()
    }

    /// Redraw the crosshair for `state` and commit the frame
    pub fn repaint(&mut self, state: &RenderState) {
        let width = self.platform.width();
        let height = self.platform.height();
        let primitives = compose(state, width, height);

        if let Some(buffer) = self.platform.pixel_buffer() {
            self.renderer.paint(buffer, width, height, &primitives);
        }
        self.platform.commit();
    }

    /// Check if the surface was resized since last check
    pub fn take_size_dirty(&mut self) -> bool {
        self.platform.take_size_dirty()
    }

    /// Poll for events (non-blocking)
    /// Returns false if the window should close
    pub fn poll_events(&mut self) -> bool {
        self.platform.poll_events()
    }

    /// Check if overlay is in interactive mode (not click-through)
    pub fn is_interactive(&self) -> bool {
        self.platform.is_interactive()
    }
}

impl<P: OverlayPlatform> WindowStyleAccess for CrosshairWindow<P> {
    fn is_ready(&self) -> bool {
        self.platform.is_ready()
    }

    fn read_style(&self) -> Result<ExtendedStyle, PlatformError> {
        self.platform.read_style()
    }

    fn write_style(&mut self, style: ExtendedStyle) -> Result<(), PlatformError> {
        self.platform.write_style(style)
    }
}
