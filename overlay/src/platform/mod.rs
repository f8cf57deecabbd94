//! Platform abstraction for the overlay window
//!
//! This module defines the traits every backend implements, so the render loop
//! and the click-through controller stay platform-agnostic.

pub mod headless;
pub mod style;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

#[cfg(target_os = "windows")]
pub mod windows;

pub use style::ExtendedStyle;

/// Configuration for creating the overlay window
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Window title / class hint, used for window-manager rules
    pub namespace: String,
    /// Explicit surface size. `None` covers the primary screen.
    pub size: Option<(u32, u32)>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            namespace: "crosshair-overlay".to_string(),
            size: None,
        }
    }
}

/// Errors that can occur in platform operations
#[derive(Debug)]
pub enum PlatformError {
    /// Failed to connect to display server
    ConnectionFailed(String),
    /// Required protocol/feature not available
    UnsupportedFeature(String),
    /// Buffer/memory allocation failed
    BufferError(String),
    /// Reading the window's extended style failed
    StyleQuery(String),
    /// Writing the window's extended style failed
    StyleUpdate(String),
    /// The write went through but the window reports a different style
    StyleRejected {
        requested: ExtendedStyle,
        actual: ExtendedStyle,
    },
    /// Generic platform error
    Other(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::ConnectionFailed(s) => write!(f, "Connection failed: {}", s),
            PlatformError::UnsupportedFeature(s) => write!(f, "Unsupported feature: {}", s),
            PlatformError::BufferError(s) => write!(f, "Buffer error: {}", s),
            PlatformError::StyleQuery(s) => write!(f, "Style query failed: {}", s),
            PlatformError::StyleUpdate(s) => write!(f, "Style update failed: {}", s),
            PlatformError::StyleRejected { requested, actual } => write!(
                f,
                "Style rejected: requested {}, window reports {}",
                requested, actual
            ),
            PlatformError::Other(s) => write!(f, "Platform error: {}", s),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Access to the native window's extended style.
///
/// The click-through controller only ever sees a window through this trait.
pub trait WindowStyleAccess {
    /// Whether the native handle is realized and can take style calls
    fn is_ready(&self) -> bool;

    /// Read the current extended style from the OS
    fn read_style(&self) -> Result<ExtendedStyle, PlatformError>;

    /// Replace the extended style
    fn write_style(&mut self, style: ExtendedStyle) -> Result<(), PlatformError>;
}

/// Swap a size-bound native resource for a freshly built one.
///
/// The replacement is built first; the old resource is released only after
/// the swap. On failure `current` is untouched and nothing is released.
pub(crate) fn replace_surface<T, E>(
    current: &mut T,
    build: impl FnOnce() -> Result<T, E>,
    release: impl FnOnce(T),
) -> Result<(), E> {
    let replacement = build()?;
    release(std::mem::replace(current, replacement));
    Ok(())
}

/// Trait that all platform backends must implement
pub trait OverlayPlatform: WindowStyleAccess + Sized {
    /// Create the overlay window: frameless, topmost, transparent background
    fn new(config: OverlayConfig) -> Result<Self, PlatformError>;

    /// Get the current width of the overlay
    fn width(&self) -> u32;

    /// Get the current height of the overlay
    fn height(&self) -> u32;

    /// Check if the surface was resized or exposed since last check (clears the flag)
    fn take_size_dirty(&mut self) -> bool;

    /// Check if overlay is in interactive mode (not click-through).
    /// Callers use this to pick the poll frequency.
    fn is_interactive(&self) -> bool;

    /// Get mutable access to the pixel buffer (RGBA format)
    /// Returns None if buffer is not ready
    fn pixel_buffer(&mut self) -> Option<&mut [u8]>;

    /// Commit the current pixel buffer to the screen
    fn commit(&mut self);

    /// Process pending platform events (non-blocking)
    /// Returns false if the overlay should close
    fn poll_events(&mut self) -> bool;
}

/// Re-export the appropriate platform for the current target
#[cfg(all(unix, not(target_os = "macos")))]
pub use x11::X11Overlay as NativeOverlay;

#[cfg(target_os = "windows")]
pub use windows::WindowsOverlay as NativeOverlay;

#[cfg(not(any(target_os = "windows", all(unix, not(target_os = "macos")))))]
pub use headless::HeadlessOverlay as NativeOverlay;

/// Whether [`NativeOverlay`] puts a real window on screen on this target
pub const HAS_NATIVE_WINDOW: bool = cfg!(any(
    target_os = "windows",
    all(unix, not(target_os = "macos"))
));
