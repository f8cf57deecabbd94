//! Messages into the overlay thread
//!
//! The overlay thread is the only owner of the settings store and the window.
//! Everything else talks to it through [`OverlayCommand`]s.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;

use crosshair_core::{PersistenceError, Settings, SettingsUpdate};

use crate::platform::ExtendedStyle;
use crate::reconcile::{ClickThroughPhase, ReconcileOptions, ReconcileStats};

pub enum OverlayCommand {
    /// Apply one settings mutation
    Update(SettingsUpdate),
    /// Persist the settings; replies with the written path
    Save(oneshot::Sender<Result<PathBuf, PersistenceError>>),
    /// Request a status snapshot
    Status(oneshot::Sender<OverlayStatus>),
    /// Stop the overlay thread
    Shutdown,
}

impl std::fmt::Debug for OverlayCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayCommand::Update(update) => f.debug_tuple("Update").field(update).finish(),
            OverlayCommand::Save(_) => f.write_str("Save"),
            OverlayCommand::Status(_) => f.write_str("Status"),
            OverlayCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Click-through part of [`OverlayStatus`]
#[derive(Debug, Clone)]
pub struct ClickThroughStatus {
    pub desired: bool,
    pub applied: Option<bool>,
    pub phase: ClickThroughPhase,
    pub stats: ReconcileStats,
    pub last_error: Option<String>,
    /// Style as currently read from the window, if the read succeeded
    pub style: Option<ExtendedStyle>,
}

/// Snapshot of the overlay thread's state
#[derive(Debug, Clone)]
pub struct OverlayStatus {
    pub settings: Settings,
    pub settings_path: PathBuf,
    /// Settings changed since the last successful save
    pub unsaved: bool,
    pub width: u32,
    pub height: u32,
    pub click_through: ClickThroughStatus,
}

/// Runtime options for the overlay thread
#[derive(Debug, Clone, Copy)]
pub struct OverlayOptions {
    pub reconcile: ReconcileOptions,
    /// Loop sleep while the window takes input
    pub interactive_poll: Duration,
    /// Loop sleep while click-through
    pub idle_poll: Duration,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            reconcile: ReconcileOptions::default(),
            interactive_poll: Duration::from_millis(16),
            idle_poll: Duration::from_millis(100),
        }
    }
}
