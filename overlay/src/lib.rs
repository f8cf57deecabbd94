//! Crosshair Overlay Library
//!
//! Full-screen transparent crosshair window with click-through control.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     spawn                           │
//! │     overlay thread: commands, events, repaint       │
//! │          (single owner of settings + window)        │
//! ├─────────────────────────────────────────────────────┤
//! │                   reconcile/                        │
//! │   ClickThroughController, ReconcileSchedule/Loop    │
//! │     (desired → applied window style, re-assert)     │
//! ├─────────────────────────────────────────────────────┤
//! │                    manager                          │
//! │                 CrosshairWindow                     │
//! │          (window + renderer wrapper)                │
//! ├─────────────────────────────────────────────────────┤
//! │              view + renderer                        │
//! │   compose() → Primitive, rasterized by tiny-skia    │
//! ├─────────────────────────────────────────────────────┤
//! │                   platform/                         │
//! │          x11, windows, headless, style              │
//! │            (OS window management)                   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod manager;
pub mod platform;
pub mod reconcile;
pub mod renderer;
pub mod spawn;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use command::{ClickThroughStatus, OverlayCommand, OverlayOptions, OverlayStatus};
pub use manager::CrosshairWindow;
pub use platform::{
    ExtendedStyle, HAS_NATIVE_WINDOW, NativeOverlay, OverlayConfig, OverlayPlatform,
    PlatformError, WindowStyleAccess,
};
pub use reconcile::{
    ClickThroughController, ClickThroughPhase, ReconcileLoop, ReconcileOptions, ReconcileOutcome,
    ReconcileSchedule, ReconcileStats, TickKind,
};
pub use renderer::Renderer;
pub use spawn::spawn_overlay;
pub use view::{Primitive, compose};
