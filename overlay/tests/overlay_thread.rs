//! Drives the overlay thread end to end on the headless backend.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;

use crosshair_core::{Settings, SettingsStore, SettingsUpdate};
use crosshair_overlay::platform::headless::{HeadlessOverlay, HeadlessRemote, PointerRoute};
use crosshair_overlay::{
    ClickThroughPhase, OverlayCommand, OverlayConfig, OverlayOptions, OverlayStatus,
    PlatformError, ReconcileOptions, spawn_overlay,
};

fn fast_options() -> OverlayOptions {
    OverlayOptions {
        reconcile: ReconcileOptions {
            startup_delay: Duration::from_millis(0),
            interval: Duration::from_millis(20),
        },
        interactive_poll: Duration::from_millis(5),
        idle_poll: Duration::from_millis(5),
    }
}

fn start(
    store: SettingsStore,
) -> (Sender<OverlayCommand>, JoinHandle<()>, HeadlessRemote) {
    let (overlay, remote) = HeadlessOverlay::with_remote(OverlayConfig {
        size: Some((64, 48)),
        ..OverlayConfig::default()
    });
    let (tx, handle) = spawn_overlay(move || Ok(overlay), store, fast_options()).unwrap();
    (tx, handle, remote)
}

fn default_store(dir: &tempfile::TempDir) -> SettingsStore {
    SettingsStore::new(dir.path().join("settings.json"), Settings::default())
}

fn status(tx: &Sender<OverlayCommand>) -> OverlayStatus {
    let (reply_tx, reply_rx) = oneshot::channel();
    tx.blocking_send(OverlayCommand::Status(reply_tx)).unwrap();
    reply_rx.blocking_recv().unwrap()
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

fn shutdown(tx: Sender<OverlayCommand>, handle: JoinHandle<()>) {
    tx.blocking_send(OverlayCommand::Shutdown).unwrap();
    handle.join().unwrap();
}

#[test]
fn toggle_through_channel_makes_window_click_through() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));

    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::ToggleClickThrough))
        .unwrap();

    assert!(wait_until(|| status(&tx).click_through.applied == Some(true)));
    assert_eq!(remote.dispatch_pointer(32, 24), PointerRoute::PassedThrough);

    let status = status(&tx);
    assert!(status.settings.click_through);
    assert_eq!(status.click_through.phase, ClickThroughPhase::Reconciled(true));

    shutdown(tx, handle);
}

#[test]
fn periodic_reassert_restores_forgotten_style() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(
        dir.path().join("settings.json"),
        Settings {
            click_through: true,
            ..Settings::default()
        },
    );
    let (tx, handle, remote) = start(store);

    assert!(wait_until(|| remote.style().satisfies(true)));
    remote.forget_style();

    assert!(wait_until(|| remote.style().satisfies(true)));
    assert!(wait_until(|| status(&tx).click_through.stats.restorations >= 1));

    shutdown(tx, handle);
}

#[test]
fn failed_write_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));
    assert!(wait_until(|| status(&tx).click_through.applied == Some(false)));

    remote.fail_next_writes(1);
    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::ClickThrough(true)))
        .unwrap();

    assert!(wait_until(|| status(&tx).click_through.applied == Some(true)));
    let status = status(&tx);
    assert_eq!(status.click_through.stats.failures, 1);
    assert!(status.click_through.last_error.is_none());

    shutdown(tx, handle);
}

#[test]
fn render_update_repaints() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));
    assert!(wait_until(|| remote.frames() >= 1));
    let before = remote.frames();

    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::Thickness(5)))
        .unwrap();
    assert!(wait_until(|| remote.frames() > before));

    // Click-through alone does not repaint
    let after_thickness = remote.frames();
    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::ClickThrough(true)))
        .unwrap();
    assert!(wait_until(|| status(&tx).click_through.applied == Some(true)));
    assert_eq!(remote.frames(), after_thickness);

    shutdown(tx, handle);
}

#[test]
fn resize_triggers_repaint() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));
    assert!(wait_until(|| remote.frames() >= 1));

    remote.resize(32, 32);
    assert!(wait_until(|| remote.last_frame().len() == 32 * 32 * 4));
    assert_eq!(status(&tx).width, 32);

    shutdown(tx, handle);
}

#[test]
fn failed_resize_keeps_rendering_at_old_size() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));
    assert!(wait_until(|| remote.frames() >= 1));

    remote.fail_next_resizes(1);
    remote.resize(32, 32);
    let frames = remote.frames();
    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::Length(5)))
        .unwrap();

    assert!(wait_until(|| remote.frames() > frames));
    assert_eq!(remote.last_frame().len(), 64 * 48 * 4);
    let snapshot = status(&tx);
    assert_eq!((snapshot.width, snapshot.height), (64, 48));

    shutdown(tx, handle);
}

#[test]
fn save_writes_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let (tx, handle, _remote) = start(SettingsStore::new(&path, Settings::default()));

    tx.blocking_send(OverlayCommand::Update(SettingsUpdate::Color([0, 255, 0])))
        .unwrap();
    assert!(status(&tx).unsaved);

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.blocking_send(OverlayCommand::Save(reply_tx)).unwrap();
    let saved = reply_rx.blocking_recv().unwrap().unwrap();
    assert_eq!(saved, path);
    assert!(!status(&tx).unsaved);

    let loaded = SettingsStore::load_or_init(&path);
    assert!(loaded.warning.is_none());
    assert_eq!(loaded.store.settings().color, [0, 255, 0]);

    shutdown(tx, handle);
}

#[test]
fn closing_window_ends_thread() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, handle, remote) = start(default_store(&dir));

    remote.close();
    handle.join().unwrap();
    assert!(tx.blocking_send(OverlayCommand::Shutdown).is_err());
}

#[test]
fn failed_window_creation_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = spawn_overlay::<HeadlessOverlay, _>(
        || Err(PlatformError::ConnectionFailed("no display".to_string())),
        default_store(&dir),
        fast_options(),
    );

    assert!(matches!(result, Err(PlatformError::ConnectionFailed(_))));
}
