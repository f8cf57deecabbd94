//! Command-line arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crosshair_core::DEFAULT_SETTINGS_FILE;
use crosshair_overlay::{OverlayOptions, ReconcileOptions};

use crate::hotkeys::{Hotkey, HotkeyBindings};

#[derive(Parser, Debug)]
#[command(version, about = "Screen-centered crosshair overlay")]
pub struct Args {
    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// How often the click-through style is re-asserted
    #[arg(long, default_value_t = 1000)]
    pub reconcile_interval_ms: u64,

    /// Delay before the first click-through reconciliation
    #[arg(long, default_value_t = 200)]
    pub startup_delay_ms: u64,

    /// Run without a native window (console only)
    #[arg(long)]
    pub headless: bool,

    /// Do not register global hotkeys
    #[arg(long)]
    pub no_hotkeys: bool,

    /// Toggle click-through
    #[arg(long, default_value = "F9")]
    pub toggle_key: Hotkey,

    /// Show or hide the console prompt
    #[arg(long, default_value = "F8")]
    pub panel_key: Hotkey,

    /// Quit. Defaults to Shift+Escape rather than plain Escape so the key
    /// stays usable in the game underneath; pass `--quit-key Escape` for that.
    #[arg(long, default_value = "Shift+Escape")]
    pub quit_key: Hotkey,
}

impl Args {
    pub fn overlay_options(&self) -> OverlayOptions {
        OverlayOptions {
            reconcile: ReconcileOptions {
                startup_delay: Duration::from_millis(self.startup_delay_ms),
                // A zero interval would re-assert on every loop pass
                interval: Duration::from_millis(self.reconcile_interval_ms.max(1)),
            },
            ..OverlayOptions::default()
        }
    }

    pub fn hotkeys(&self) -> HotkeyBindings {
        HotkeyBindings {
            toggle_click_through: self.toggle_key.clone(),
            toggle_panel: self.panel_key.clone(),
            quit: self.quit_key.clone(),
        }
    }
}
