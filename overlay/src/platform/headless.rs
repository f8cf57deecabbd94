//! Headless overlay backend
//!
//! Keeps the pixel buffer and the extended style in memory. Used by
//! `--headless` runs and by tests. A [`HeadlessRemote`] shares the window's
//! state with another thread so callers can simulate the OS: revert the style,
//! refuse writes, delay realization, route synthetic pointer events.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{
    ExtendedStyle, OverlayConfig, OverlayPlatform, PlatformError, WindowStyleAccess,
    replace_surface,
};
use crate::renderer::Renderer;

const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;

/// Style a freshly created window carries
const INITIAL_STYLE: ExtendedStyle = ExtendedStyle::LAYERED;

/// Where a pointer event ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRoute {
    /// The overlay received the event
    Overlay,
    /// The event went to the next window in z-order
    PassedThrough,
}

#[derive(Debug)]
struct HeadlessState {
    style: ExtendedStyle,
    ready: bool,
    open: bool,
    failing_writes: u32,
    failing_resizes: u32,
    style_reads: u32,
    style_writes: u32,
    frames: u32,
    pending_size: Option<(u32, u32)>,
    last_frame: Vec<u8>,
}

/// In-memory overlay window
pub struct HeadlessOverlay {
    width: u32,
    height: u32,
    pixel_data: Vec<u8>,
    size_dirty: bool,
    state: Arc<Mutex<HeadlessState>>,
}

/// Handle for observing and perturbing a [`HeadlessOverlay`] from outside
#[derive(Clone)]
pub struct HeadlessRemote {
    state: Arc<Mutex<HeadlessState>>,
}

fn lock(state: &Mutex<HeadlessState>) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl HeadlessOverlay {
    /// Create a window together with a handle onto its state
    pub fn with_remote(config: OverlayConfig) -> (Self, HeadlessRemote) {
        let (width, height) = config.size.unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let state = Arc::new(Mutex::new(HeadlessState {
            style: INITIAL_STYLE,
            ready: true,
            open: true,
            failing_writes: 0,
            failing_resizes: 0,
            style_reads: 0,
            style_writes: 0,
            frames: 0,
            pending_size: None,
            last_frame: Vec::new(),
        }));

        debug!(namespace = %config.namespace, width, height, "Headless overlay created");

        let overlay = Self {
            width,
            height,
            pixel_data: Renderer::create_buffer(width, height),
            size_dirty: false,
            state: Arc::clone(&state),
        };
        (overlay, HeadlessRemote { state })
    }

    pub fn remote(&self) -> HeadlessRemote {
        HeadlessRemote {
            state: Arc::clone(&self.state),
        }
    }
}

impl WindowStyleAccess for HeadlessOverlay {
    fn is_ready(&self) -> bool {
        let state = lock(&self.state);
        state.ready && state.open
    }

    fn read_style(&self) -> Result<ExtendedStyle, PlatformError> {
        let mut state = lock(&self.state);
        state.style_reads += 1;
        Ok(state.style)
    }

    fn write_style(&mut self, style: ExtendedStyle) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(PlatformError::StyleUpdate(
                "headless window refused the write".to_string(),
            ));
        }
        state.style = style;
        state.style_writes += 1;
        Ok(())
    }
}

impl OverlayPlatform for HeadlessOverlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Ok(Self::with_remote(config).0)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn take_size_dirty(&mut self) -> bool {
        std::mem::take(&mut self.size_dirty)
    }

    fn is_interactive(&self) -> bool {
        !lock(&self.state).style.contains(ExtendedStyle::TRANSPARENT)
    }

    fn pixel_buffer(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.pixel_data)
    }

    fn commit(&mut self) {
        let mut state = lock(&self.state);
        state.frames += 1;
        state.last_frame.clear();
        state.last_frame.extend_from_slice(&self.pixel_data);
    }

    fn poll_events(&mut self) -> bool {
        let (pending, fail_resize) = {
            let mut state = lock(&self.state);
            if !state.open {
                return false;
            }
            let pending = state
                .pending_size
                .take()
                .filter(|&size| size != (self.width, self.height));
            let fail_resize = pending.is_some() && state.failing_resizes > 0;
            if fail_resize {
                state.failing_resizes -= 1;
            }
            (pending, fail_resize)
        };

        if let Some((width, height)) = pending {
            let resized = replace_surface(
                &mut self.pixel_data,
                || {
                    if fail_resize {
                        Err(PlatformError::BufferError(
                            "headless buffer allocation refused".to_string(),
                        ))
                    } else {
                        Ok(Renderer::create_buffer(width, height))
                    }
                },
                drop,
            );
            match resized {
                Ok(()) => {
                    self.width = width;
                    self.height = height;
                    self.size_dirty = true;
                }
                Err(e) => warn!(error = %e, "Failed to resize headless buffer, keeping old size"),
            }
        }
        true
    }
}

impl HeadlessRemote {
    /// Current style as the "OS" sees it
    pub fn style(&self) -> ExtendedStyle {
        lock(&self.state).style
    }

    /// Overwrite the style behind the controller's back
    pub fn set_style(&self, style: ExtendedStyle) {
        lock(&self.state).style = style;
    }

    /// Simulate a compositor/driver silently resetting the window style
    pub fn forget_style(&self) {
        self.set_style(INITIAL_STYLE);
    }

    /// Mark the native handle realized or not
    pub fn set_ready(&self, ready: bool) {
        lock(&self.state).ready = ready;
    }

    /// Make the next `count` style writes fail
    pub fn fail_next_writes(&self, count: u32) {
        lock(&self.state).failing_writes = count;
    }

    /// Make the next `count` buffer reallocations fail
    pub fn fail_next_resizes(&self, count: u32) {
        lock(&self.state).failing_resizes = count;
    }

    pub fn style_reads(&self) -> u32 {
        lock(&self.state).style_reads
    }

    pub fn style_writes(&self) -> u32 {
        lock(&self.state).style_writes
    }

    /// Number of committed frames
    pub fn frames(&self) -> u32 {
        lock(&self.state).frames
    }

    /// Copy of the last committed RGBA frame
    pub fn last_frame(&self) -> Vec<u8> {
        lock(&self.state).last_frame.clone()
    }

    /// Simulate a display mode change
    pub fn resize(&self, width: u32, height: u32) {
        lock(&self.state).pending_size = Some((width, height));
    }

    /// Simulate the user closing the window
    pub fn close(&self) {
        lock(&self.state).open = false;
    }

    /// Route a synthetic pointer event through the current style
    pub fn dispatch_pointer(&self, x: i32, y: i32) -> PointerRoute {
        let route = if lock(&self.state).style.contains(ExtendedStyle::TRANSPARENT) {
            PointerRoute::PassedThrough
        } else {
            PointerRoute::Overlay
        };
        debug!(x, y, ?route, "Synthetic pointer event");
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> OverlayConfig {
        OverlayConfig {
            size: Some((64, 48)),
            ..OverlayConfig::default()
        }
    }

    #[test]
    fn test_pointer_routing_follows_style() {
        let (mut overlay, remote) = HeadlessOverlay::with_remote(small_config());
        assert_eq!(remote.dispatch_pointer(10, 10), PointerRoute::Overlay);

        overlay.write_style(ExtendedStyle::CLICK_THROUGH).unwrap();
        assert_eq!(remote.dispatch_pointer(10, 10), PointerRoute::PassedThrough);
        assert!(!overlay.is_interactive());
    }

    #[test]
    fn test_failing_writes_leave_style_untouched() {
        let (mut overlay, remote) = HeadlessOverlay::with_remote(small_config());
        remote.fail_next_writes(1);

        assert!(overlay.write_style(ExtendedStyle::CLICK_THROUGH).is_err());
        assert_eq!(remote.style(), ExtendedStyle::LAYERED);
        assert!(overlay.write_style(ExtendedStyle::CLICK_THROUGH).is_ok());
        assert_eq!(remote.style_writes(), 1);
    }

    #[test]
    fn test_resize_marks_size_dirty() {
        let (mut overlay, remote) = HeadlessOverlay::with_remote(small_config());
        remote.resize(32, 16);

        assert!(overlay.poll_events());
        assert_eq!((overlay.width(), overlay.height()), (32, 16));
        assert!(overlay.take_size_dirty());
        assert!(!overlay.take_size_dirty());
        assert_eq!(overlay.pixel_buffer().map(|b| b.len()), Some(32 * 16 * 4));
    }

    #[test]
    fn test_failed_resize_keeps_old_surface() {
        let mut overlay = HeadlessOverlay::new(small_config()).unwrap();
        let remote = overlay.remote();
        remote.fail_next_resizes(1);
        remote.resize(32, 16);

        assert!(overlay.poll_events());
        assert_eq!((overlay.width(), overlay.height()), (64, 48));
        assert!(!overlay.take_size_dirty());
        assert_eq!(overlay.pixel_buffer().map(|b| b.len()), Some(64 * 48 * 4));

        // The next size change goes through
        remote.resize(32, 16);
        assert!(overlay.poll_events());
        assert_eq!((overlay.width(), overlay.height()), (32, 16));
        assert_eq!(overlay.pixel_buffer().map(|b| b.len()), Some(32 * 16 * 4));
    }

    #[test]
    fn test_close_stops_polling() {
        let (mut overlay, remote) = HeadlessOverlay::with_remote(small_config());
        remote.close();
        assert!(!overlay.poll_events());
        assert!(!overlay.is_ready());
    }
}
