//! Crosshair core
//!
//! Settings model, settings updates and the JSON-backed settings store.
//! The overlay thread owns the one [`SettingsStore`]; every other part of the
//! program describes changes as [`SettingsUpdate`] values and submits them.

pub mod error;
pub mod settings;
pub mod store;
pub mod update;

pub use error::PersistenceError;
pub use settings::{CrosshairMode, RenderState, Settings, limits};
pub use store::{DEFAULT_SETTINGS_FILE, LoadOutcome, SettingsStore};
pub use update::{SettingsUpdate, UpdateEffect};
