//! Control panel visibility
//!
//! Shared between the console (which reads it) and the hotkey listener
//! (which toggles it). It only controls the console's prompt and echo, never
//! settings or the window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
pub struct PanelVisibility(Arc<AtomicBool>);

impl PanelVisibility {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Flip visibility, returning the new value
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }
}
