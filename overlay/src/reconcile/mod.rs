//! Click-through reconciliation
//!
//! Window style is treated as state that must be continuously driven toward
//! the desired value, not configured once. Some compositor/driver combinations
//! silently clear extended style bits (display mode changes, focus churn), so
//! the overlay thread re-checks the style on a fixed cadence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │           SettingsUpdate::ClickThrough / Toggle...           │
//! │                (console, hotkeys, via channel)               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │ set_desired()
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ReconcileLoop                                               │
//! │   ReconcileSchedule: startup deferral, immediate, periodic   │
//! │   ClickThroughController: desired / applied, reconcile()     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │ read_style() / write_style()
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │               WindowStyleAccess (per platform)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod controller;
mod driver;
mod schedule;

#[cfg(test)]
mod controller_tests;

pub use controller::{ClickThroughController, ClickThroughPhase, ReconcileOutcome, ReconcileStats};
pub use driver::{ReconcileLoop, TickReport};
pub use schedule::{ReconcileOptions, ReconcileSchedule, TickKind};
