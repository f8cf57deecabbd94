//! Global hotkey registration
//!
//! Bindings are accelerator strings like `"Shift+Escape"` or `"F9"`, parsed and
//! registered through `global-hotkey`. Every binding either submits an
//! [`OverlayCommand`] or flips the panel flag; the listener never touches
//! settings or the window itself.

use std::fmt;
use std::str::FromStr;
use std::thread::JoinHandle;

use global_hotkey::hotkey::HotKey;
use tokio::sync::mpsc::Sender;
use tracing::debug;

use crosshair_core::SettingsUpdate;
use crosshair_overlay::OverlayCommand;

use crate::panel::PanelVisibility;

/// A parsed accelerator, displayed as the user wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    text: String,
    hotkey: HotKey,
}

impl Hotkey {
    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }

    /// Id carried by the events this binding fires
    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }
}

impl FromStr for Hotkey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let hotkey =
            HotKey::from_str(text).map_err(|e| format!("invalid hotkey '{}': {}", text, e))?;
        Ok(Self {
            text: text.to_string(),
            hotkey,
        })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    ToggleClickThrough,
    TogglePanel,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub toggle_click_through: Hotkey,
    pub toggle_panel: Hotkey,
    pub quit: Hotkey,
}

impl HotkeyBindings {
    pub fn iter(&self) -> impl Iterator<Item = (HotkeyAction, &Hotkey)> {
        [
            (HotkeyAction::ToggleClickThrough, &self.toggle_click_through),
            (HotkeyAction::TogglePanel, &self.toggle_panel),
            (HotkeyAction::Quit, &self.quit),
        ]
        .into_iter()
    }

    /// Action bound to a hotkey event id
    pub fn action_for(&self, id: u32) -> Option<HotkeyAction> {
        self.iter()
            .find(|(_, hotkey)| hotkey.id() == id)
            .map(|(action, _)| action)
    }
}

/// Carry out a triggered binding. Returns false once the overlay is gone.
pub fn dispatch(action: HotkeyAction, tx: &Sender<OverlayCommand>, panel: &PanelVisibility) -> bool {
    debug!(?action, "Hotkey pressed");
    match action {
        HotkeyAction::ToggleClickThrough => tx
            .blocking_send(OverlayCommand::Update(SettingsUpdate::ToggleClickThrough))
            .is_ok(),
        HotkeyAction::TogglePanel => {
            panel.toggle();
            !tx.is_closed()
        }
        HotkeyAction::Quit => tx.blocking_send(OverlayCommand::Shutdown).is_ok(),
    }
}

/// Handle one hotkey event. Returns false when the listener should stop.
fn on_event(
    id: u32,
    pressed: bool,
    bindings: &HotkeyBindings,
    tx: &Sender<OverlayCommand>,
    panel: &PanelVisibility,
) -> bool {
    if !pressed {
        return true;
    }
    let Some(action) = bindings.action_for(id) else {
        return true;
    };
    dispatch(action, tx, panel) && action != HotkeyAction::Quit
}

/// Start the hotkey listener thread.
///
/// Returns `None` when no binding could be registered (no hotkey backend,
/// every key taken by another program) or the thread could not be started.
#[cfg(not(target_os = "macos"))]
pub fn spawn_hotkey_listener(
    bindings: HotkeyBindings,
    tx: Sender<OverlayCommand>,
    panel: PanelVisibility,
) -> Option<JoinHandle<()>> {
    // Registration result comes back from the spawned thread
    let (confirm_tx, confirm_rx) = std::sync::mpsc::channel::<bool>();

    let spawned = std::thread::Builder::new()
        .name("crosshair-hotkeys".to_string())
        .spawn(move || listener::run(bindings, tx, panel, confirm_tx));

    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start hotkey thread");
            return None;
        }
    };

    match confirm_rx.recv() {
        Ok(true) => Some(handle),
        _ => None,
    }
}

/// The hotkey backend needs a run loop on the main thread here, and the main
/// thread is parked on the overlay thread.
#[cfg(target_os = "macos")]
pub fn spawn_hotkey_listener(
    bindings: HotkeyBindings,
    _tx: Sender<OverlayCommand>,
    _panel: PanelVisibility,
) -> Option<JoinHandle<()>> {
    tracing::warn!(
        toggle = %bindings.toggle_click_through,
        panel = %bindings.toggle_panel,
        quit = %bindings.quit,
        "Global hotkeys are not supported on this platform; use the console"
    );
    None
}

#[cfg(not(target_os = "macos"))]
mod listener {
    use std::sync::mpsc;

    use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
    use tokio::sync::mpsc::Sender;
    use tracing::{error, info};

    use crosshair_overlay::OverlayCommand;

    use super::{HotkeyBindings, on_event};
    use crate::panel::PanelVisibility;

    pub(super) fn run(
        bindings: HotkeyBindings,
        tx: Sender<OverlayCommand>,
        panel: PanelVisibility,
        confirm: mpsc::Sender<bool>,
    ) {
        let manager = match GlobalHotKeyManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                error!(error = %e, "Global hotkeys unavailable");
                let _ = confirm.send(false);
                return;
            }
        };

        let mut registered = 0;
        for (action, hotkey) in bindings.iter() {
            match manager.register(hotkey.hotkey()) {
                Ok(()) => {
                    info!(%hotkey, ?action, "Registered hotkey");
                    registered += 1;
                }
                Err(e) => error!(%hotkey, ?action, error = %e, "Failed to register hotkey"),
            }
        }
        let _ = confirm.send(registered > 0);
        if registered == 0 {
            return;
        }

        pump(|event| {
            let pressed = matches!(event.state(), HotKeyState::Pressed);
            on_event(event.id(), pressed, &bindings, &tx, &panel)
        });

        for (_, hotkey) in bindings.iter() {
            let _ = manager.unregister(hotkey.hotkey());
        }
        info!("Hotkey listener stopped");
    }

    /// Events arrive through a hidden window owned by this thread, so its
    /// message queue has to be serviced.
    #[cfg(target_os = "windows")]
    fn pump(mut handle: impl FnMut(GlobalHotKeyEvent) -> bool) {
        use windows::Win32::Foundation::HWND;
        use windows::Win32::UI::WindowsAndMessaging::{
            DispatchMessageW, GetMessageW, MSG, TranslateMessage,
        };

        let events = GlobalHotKeyEvent::receiver();
        let mut msg = MSG::default();
        loop {
            // SAFETY: msg is a valid out-pointer; 0/-1 end the loop
            let result = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
            if result.0 <= 0 {
                return;
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            while let Ok(event) = events.try_recv() {
                if !handle(event) {
                    return;
                }
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn pump(mut handle: impl FnMut(GlobalHotKeyEvent) -> bool) {
        let events = GlobalHotKeyEvent::receiver();
        while let Ok(event) = events.recv() {
            if !handle(event) {
                return;
            }
        }
    }
}
