use std::io;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing::{error, info, warn};

use crosshair::console::{self, ConsoleExit, error_chain};
use crosshair::hotkeys::spawn_hotkey_listener;
use crosshair::{Args, PanelVisibility, logging};
use crosshair_core::SettingsStore;
use crosshair_overlay::platform::headless::HeadlessOverlay;
use crosshair_overlay::{
    HAS_NATIVE_WINDOW, NativeOverlay, OverlayCommand, OverlayConfig, OverlayPlatform,
    spawn_overlay,
};

fn main() -> ExitCode {
    let args = Args::parse();

    // Must be held until exit so buffered log lines are flushed
    let _log_guard = logging::init();

    let loaded = SettingsStore::load_or_init(args.settings.clone());
    if let Some(warning) = &loaded.warning {
        warn!(error = %error_chain(warning), "Settings file problem");
        eprintln!("warning: {}", error_chain(warning));
    }

    let headless = args.headless || !HAS_NATIVE_WINDOW;
    if !args.headless && !HAS_NATIVE_WINDOW {
        warn!("No native overlay window on this platform, running headless");
    }

    let config = OverlayConfig::default();
    let options = args.overlay_options();
    let spawned = if headless {
        spawn_overlay(move || HeadlessOverlay::new(config), loaded.store, options)
    } else {
        spawn_overlay(move || NativeOverlay::new(config), loaded.store, options)
    };
    let (tx, overlay) = match spawned {
        Ok(spawned) => spawned,
        Err(e) => {
            error!(error = %e, "Failed to create overlay window");
            eprintln!("error: failed to create overlay window: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(headless, settings = %args.settings.display(), "Crosshair started");

    let panel = PanelVisibility::new(true);

    let hotkeys = if args.no_hotkeys {
        None
    } else {
        spawn_hotkey_listener(args.hotkeys(), tx.clone(), panel.clone())
    };
    let hotkeys_active = hotkeys.is_some();

    // Detached: a blocked stdin read must not hold up shutdown
    let console_tx = tx.clone();
    let console_panel = panel.clone();
    let console = thread::Builder::new()
        .name("crosshair-console".to_string())
        .spawn(move || {
            let exit = console::run(
                &console_tx,
                &console_panel,
                io::stdin().lock(),
                io::stdout(),
            );
            info!(?exit, "Console stopped");
            // Without hotkeys the console is the only way to quit
            if exit == ConsoleExit::EndOfInput && !hotkeys_active {
                let _ = console_tx.blocking_send(OverlayCommand::Shutdown);
            }
        });
    if let Err(e) = console {
        warn!(error = %e, "Failed to start console thread");
    }

    drop(tx);

    if overlay.join().is_err() {
        error!("Overlay thread panicked");
        return ExitCode::FAILURE;
    }

    info!("Crosshair stopped");
    ExitCode::SUCCESS
}
