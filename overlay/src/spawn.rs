//! Overlay thread
//!
//! # Important: Threading Model
//!
//! On Windows, HWND handles must be used from the thread that created them.
//! The Win32 message queue is tied to the creating thread, so SetWindowLongPtrW,
//! PeekMessageW, and other window operations fail when called from a different thread.
//!
//! The window is therefore created INSIDE the spawned thread via a factory
//! function. That thread also owns the settings store and the click-through
//! controller; every other thread only sends [`OverlayCommand`]s.

use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio::sync::mpsc::{self, Sender};
use tracing::{debug, info, warn};

use crosshair_core::SettingsStore;

use crate::command::{ClickThroughStatus, OverlayCommand, OverlayOptions, OverlayStatus};
use crate::manager::CrosshairWindow;
use crate::platform::{OverlayPlatform, PlatformError, WindowStyleAccess};
use crate::reconcile::ReconcileLoop;

/// Command channel capacity
const COMMAND_BUFFER: usize = 32;

/// Spawn the overlay thread, creating the window inside it with `create_window`.
///
/// Returns `Err` if window creation fails (confirmed via channel from the
/// spawned thread). The thread runs until it receives
/// [`OverlayCommand::Shutdown`] or the window is closed.
pub fn spawn_overlay<P, F>(
    create_window: F,
    store: SettingsStore,
    options: OverlayOptions,
) -> Result<(Sender<OverlayCommand>, JoinHandle<()>), PlatformError>
where
    P: OverlayPlatform,
    F: FnOnce() -> Result<P, PlatformError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<OverlayCommand>(COMMAND_BUFFER);

    // Creation result comes back from the spawned thread
    let (confirm_tx, confirm_rx) = std::sync::mpsc::channel::<Result<(), PlatformError>>();

    let handle = thread::Builder::new()
        .name("crosshair-overlay".to_string())
        .spawn(move || {
            // Create the window INSIDE this thread - critical for Windows HWND threading
            let platform = match create_window() {
                Ok(p) => {
                    let _ = confirm_tx.send(Ok(()));
                    p
                }
                Err(e) => {
                    let _ = confirm_tx.send(Err(e));
                    return;
                }
            };

            run_overlay_loop(CrosshairWindow::from_platform(platform), store, options, rx);
        })
        .map_err(|e| PlatformError::Other(format!("failed to spawn overlay thread: {}", e)))?;

    // Wait for confirmation from the spawned thread
    match confirm_rx.recv() {
        Ok(Ok(())) => Ok((tx, handle)),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(PlatformError::Other(
            "Overlay thread exited before confirming creation".to_string(),
        )),
    }
}

/// Drain commands, poll the window, run due reconciliation, repaint, sleep.
fn run_overlay_loop<P: OverlayPlatform>(
    mut window: CrosshairWindow<P>,
    mut store: SettingsStore,
    options: OverlayOptions,
    mut rx: mpsc::Receiver<OverlayCommand>,
) {
    let mut reconcile = ReconcileLoop::new(
        store.settings().click_through,
        Instant::now(),
        options.reconcile,
    );
    let mut needs_render = true;

    info!(
        width = window.width(),
        height = window.height(),
        click_through = store.settings().click_through,
        "Overlay thread started"
    );

    loop {
        // Process all pending commands
        while let Ok(cmd) = rx.try_recv() {
            match cmd {
                OverlayCommand::Update(update) => {
                    let effect = store.apply(update);
                    if effect.repaint {
                        needs_render = true;
                    }
                    if effect.click_through_changed {
                        reconcile.set_desired(store.settings().click_through);
                    }
                }
                OverlayCommand::Save(reply) => {
                    let result = store.commit().map(Path::to_path_buf);
                    if let Err(e) = &result {
                        warn!(error = %e, "Failed to save settings");
                    }
                    let _ = reply.send(result);
                }
                OverlayCommand::Status(reply) => {
                    let _ = reply.send(status(&window, &store, &reconcile));
                }
                OverlayCommand::Shutdown => {
                    info!("Overlay thread shutting down");
                    return;
                }
            }
        }

        // Poll window events (returns false if window should close)
        if !window.poll_events() {
            info!("Overlay window closed");
            break;
        }

        if window.take_size_dirty() {
            debug!(
                width = window.width(),
                height = window.height(),
                "Overlay resized"
            );
            needs_render = true;
        }

        let now = Instant::now();
        reconcile.tick(&mut window, now);

        if needs_render {
            window.repaint(&store.settings().render_state());
            needs_render = false;
        }

        // Short sleep while interactive, longer while click-through,
        // never past the next reconcile tick
        let poll = if window.is_interactive() {
            options.interactive_poll
        } else {
            options.idle_poll
        };
        let until_tick = reconcile
            .schedule()
            .next_due()
            .saturating_duration_since(Instant::now());
        thread::sleep(poll.min(until_tick.max(std::time::Duration::from_millis(1))));
    }
}

fn status<P: OverlayPlatform>(
    window: &CrosshairWindow<P>,
    store: &SettingsStore,
    reconcile: &ReconcileLoop,
) -> OverlayStatus {
    let controller = reconcile.controller();
    let style = if window.is_ready() {
        window.read_style().ok()
    } else {
        None
    };

    OverlayStatus {
        settings: store.settings().clone(),
        settings_path: store.path().to_path_buf(),
        unsaved: store.is_dirty(),
        width: window.width(),
        height: window.height(),
        click_through: ClickThroughStatus {
            desired: controller.desired(),
            applied: controller.applied(),
            phase: controller.phase(),
            stats: controller.stats(),
            last_error: controller.last_error().map(str::to_string),
            style,
        },
    }
}
