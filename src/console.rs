//! Line-oriented control console
//!
//! Reads commands from stdin, parses them with `shlex` + `clap`, clamps values
//! to the UI ranges and forwards them to the overlay thread. The console never
//! touches settings directly.

use std::error::Error;
use std::io::{BufRead, Write};

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crosshair_core::{CrosshairMode, SettingsUpdate};
use crosshair_overlay::{ClickThroughPhase, OverlayCommand, OverlayStatus};

use crate::panel::PanelVisibility;

const PROMPT: &str = "> ";

#[derive(Parser, Debug)]
#[command(name = "crosshair", disable_help_flag = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Crosshair shape
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Line and dot color
    Color { r: u8, g: u8, b: u8 },
    /// Opacity, 0.1 to 1.0
    Alpha { value: f32 },
    /// Line thickness in pixels
    Thickness { value: u32 },
    /// Arm length in pixels
    Length { value: u32 },
    /// Distance from the center to the start of each arm
    Gap { value: u32 },
    /// Center dot diameter
    DotSize { value: u32 },
    /// Draw a dot at the center in cross mode
    CenterDot {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Pass mouse input through the overlay; toggles without an argument
    ClickThrough {
        #[arg(value_enum)]
        state: Option<Switch>,
    },
    /// Write settings to disk
    Save,
    /// Show settings and click-through state
    Status,
    /// Show or hide the prompt
    Panel,
    /// Exit
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Cross,
    Dot,
}

impl From<ModeArg> for CrosshairMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cross => CrosshairMode::Cross,
            ModeArg::Dot => CrosshairMode::Dot,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

/// What a parsed command asks the console to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleAction {
    /// Forward a clamped settings update
    Submit(SettingsUpdate),
    Save,
    Status,
    TogglePanel,
    Quit,
}

impl From<ConsoleCommand> for ConsoleAction {
    fn from(command: ConsoleCommand) -> Self {
        let update = match command {
            ConsoleCommand::Mode { mode } => SettingsUpdate::Mode(mode.into()),
            ConsoleCommand::Color { r, g, b } => SettingsUpdate::Color([r, g, b]),
            ConsoleCommand::Alpha { value } => SettingsUpdate::Alpha(value),
            ConsoleCommand::Thickness { value } => SettingsUpdate::Thickness(value),
            ConsoleCommand::Length { value } => SettingsUpdate::Length(value),
            ConsoleCommand::Gap { value } => SettingsUpdate::Gap(value),
            ConsoleCommand::DotSize { value } => SettingsUpdate::DotSize(value),
            ConsoleCommand::CenterDot { state } => SettingsUpdate::ShowCenterDot(state.into()),
            ConsoleCommand::ClickThrough { state: Some(state) } => {
                SettingsUpdate::ClickThrough(state.into())
            }
            ConsoleCommand::ClickThrough { state: None } => SettingsUpdate::ToggleClickThrough,
            ConsoleCommand::Save => return ConsoleAction::Save,
            ConsoleCommand::Status => return ConsoleAction::Status,
            ConsoleCommand::Panel => return ConsoleAction::TogglePanel,
            ConsoleCommand::Quit => return ConsoleAction::Quit,
        };
        ConsoleAction::Submit(update.clamped())
    }
}

/// Why the console stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The user asked to quit; shutdown was requested
    Quit,
    /// stdin closed
    EndOfInput,
    /// The overlay thread is gone
    OverlayGone,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleAction>, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    if args.is_empty() {
        return Ok(None);
    }
    args.insert(0, "crosshair".to_string());
    let parsed = ConsoleLine::try_parse_from(args).map_err(|e| e.to_string())?;
    Ok(Some(parsed.command.into()))
}

/// Run the console until quit, end of input, or the overlay thread exits
pub fn run<R: BufRead, W: Write>(
    tx: &Sender<OverlayCommand>,
    panel: &PanelVisibility,
    mut input: R,
    mut output: W,
) -> ConsoleExit {
    let mut line = String::new();

    loop {
        if panel.is_visible() {
            let _ = write!(output, "{}", PROMPT);
            let _ = output.flush();
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => return ConsoleExit::EndOfInput,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                return ConsoleExit::EndOfInput;
            }
        }

        let action = match parse_line(line.trim()) {
            Ok(Some(action)) => action,
            Ok(None) => continue,
            Err(msg) => {
                let _ = writeln!(output, "{}", msg.trim_end());
                continue;
            }
        };
        debug!(?action, "Console command");

        let echo = panel.is_visible();
        match execute(action, tx, panel) {
            Ok(Reply::Done) => {}
            Ok(Reply::Message(msg)) => {
                if echo {
                    let _ = writeln!(output, "{}", msg);
                }
            }
            Ok(Reply::Report(msg)) => {
                let _ = writeln!(output, "{}", msg);
            }
            Ok(Reply::Quit) => return ConsoleExit::Quit,
            Err(Disconnected) => {
                let _ = writeln!(output, "overlay is not running");
                return ConsoleExit::OverlayGone;
            }
        }
    }
}

/// Console output for an executed action
enum Reply {
    Done,
    /// Confirmation, shown only while the panel is visible
    Message(String),
    /// Always shown: errors and explicit queries
    Report(String),
    Quit,
}

/// The overlay command channel is closed
struct Disconnected;

fn execute(
    action: ConsoleAction,
    tx: &Sender<OverlayCommand>,
    panel: &PanelVisibility,
) -> Result<Reply, Disconnected> {
    match action {
        ConsoleAction::Submit(update) => {
            send(tx, OverlayCommand::Update(update))?;
            Ok(Reply::Done)
        }
        ConsoleAction::Save => {
            let (reply_tx, reply_rx) = oneshot::channel();
            send(tx, OverlayCommand::Save(reply_tx))?;
            match reply_rx.blocking_recv().map_err(|_| Disconnected)? {
                Ok(path) => Ok(Reply::Message(format!("saved {}", path.display()))),
                Err(e) => Ok(Reply::Report(format!("save failed: {}", error_chain(&e)))),
            }
        }
        ConsoleAction::Status => {
            let (reply_tx, reply_rx) = oneshot::channel();
            send(tx, OverlayCommand::Status(reply_tx))?;
            let status = reply_rx.blocking_recv().map_err(|_| Disconnected)?;
            Ok(Reply::Report(format_status(&status)))
        }
        ConsoleAction::TogglePanel => {
            let visible = panel.toggle();
            Ok(Reply::Report(format!(
                "panel {}",
                if visible { "shown" } else { "hidden" }
            )))
        }
        ConsoleAction::Quit => {
            send(tx, OverlayCommand::Shutdown)?;
            Ok(Reply::Quit)
        }
    }
}

fn send(tx: &Sender<OverlayCommand>, command: OverlayCommand) -> Result<(), Disconnected> {
    tx.blocking_send(command).map_err(|_| Disconnected)
}

/// `outer: inner: innermost`
pub fn error_chain(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

pub fn format_status(status: &OverlayStatus) -> String {
    let s = &status.settings;
    let ct = &status.click_through;

    let applied = match ct.applied {
        Some(value) => on_off(value),
        None => "pending",
    };
    let phase = match ct.phase {
        ClickThroughPhase::Uninitialized => "uninitialized",
        ClickThroughPhase::Reconciled(_) => "reconciled",
        ClickThroughPhase::Diverged => "diverged",
    };
    let style = ct
        .style
        .map(|style| style.to_string())
        .unwrap_or_else(|| "unavailable".to_string());

    let mut text = format!(
        "mode={} color={},{},{} alpha={:.2} thickness={} length={} gap={} dot-size={} center-dot={}\n\
         click-through: desired={} applied={} ({}) style={}\n\
         reconcile: writes={} restorations={} failures={}\n\
         surface: {}x{}\n\
         settings: {}{}",
        s.mode,
        s.color[0],
        s.color[1],
        s.color[2],
        s.alpha,
        s.thickness,
        s.length,
        s.gap,
        s.dot_size,
        on_off(s.show_center_dot),
        on_off(ct.desired),
        applied,
        phase,
        style,
        ct.stats.writes,
        ct.stats.restorations,
        ct.stats.failures,
        status.width,
        status.height,
        status.settings_path.display(),
        if status.unsaved { " (unsaved)" } else { "" },
    );
    if let Some(err) = &ct.last_error {
        text.push_str("\nlast error: ");
        text.push_str(err);
    }
    text
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::thread;

    use tokio::sync::mpsc;

    use crosshair_core::{PersistenceError, Settings};
    use crosshair_overlay::{ClickThroughStatus, ReconcileStats};

    use super::*;

    fn action(line: &str) -> ConsoleAction {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_settings_commands() {
        assert_eq!(
            action("mode dot"),
            ConsoleAction::Submit(SettingsUpdate::Mode(CrosshairMode::Dot))
        );
        assert_eq!(
            action("color 255 0 128"),
            ConsoleAction::Submit(SettingsUpdate::Color([255, 0, 128]))
        );
        assert_eq!(
            action("center-dot on"),
            ConsoleAction::Submit(SettingsUpdate::ShowCenterDot(true))
        );
        assert_eq!(
            action("dot-size 8"),
            ConsoleAction::Submit(SettingsUpdate::DotSize(8))
        );
    }

    #[test]
    fn test_values_are_clamped() {
        assert_eq!(
            action("thickness 500"),
            ConsoleAction::Submit(SettingsUpdate::Thickness(20))
        );
        assert_eq!(
            action("alpha 0"),
            ConsoleAction::Submit(SettingsUpdate::Alpha(0.1))
        );
        assert_eq!(
            action("length 0"),
            ConsoleAction::Submit(SettingsUpdate::Length(1))
        );
        assert_eq!(
            action("dot-size 0"),
            ConsoleAction::Submit(SettingsUpdate::DotSize(1))
        );
    }

    #[test]
    fn test_click_through_argument_is_optional() {
        assert_eq!(
            action("click-through"),
            ConsoleAction::Submit(SettingsUpdate::ToggleClickThrough)
        );
        assert_eq!(
            action("click-through off"),
            ConsoleAction::Submit(SettingsUpdate::ClickThrough(false))
        );
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(action("save"), ConsoleAction::Save);
        assert_eq!(action("status"), ConsoleAction::Status);
        assert_eq!(action("panel"), ConsoleAction::TogglePanel);
        assert_eq!(action("quit"), ConsoleAction::Quit);
        assert_eq!(action("exit"), ConsoleAction::Quit);
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert!(parse_line("mode square").is_err());
        assert!(parse_line("color 300 0 0").is_err());
        assert!(parse_line("color \"1 2 3").is_err());
        assert!(parse_line("frobnicate").is_err());
    }

    /// Answers overlay commands on a background thread like the overlay would
    fn fake_overlay(
        save_result: fn() -> Result<PathBuf, PersistenceError>,
    ) -> (Sender<OverlayCommand>, thread::JoinHandle<Vec<String>>) {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            while let Some(cmd) = rx.blocking_recv() {
                seen.push(format!("{:?}", cmd));
                match cmd {
                    OverlayCommand::Save(reply) => {
                        let _ = reply.send(save_result());
                    }
                    OverlayCommand::Status(reply) => {
                        let _ = reply.send(sample_status());
                    }
                    OverlayCommand::Shutdown => break,
                    _ => {}
                }
            }
            seen
        });
        (tx, handle)
    }

    fn sample_status() -> OverlayStatus {
        OverlayStatus {
            settings: Settings::default(),
            settings_path: PathBuf::from("crosshair_settings.json"),
            unsaved: true,
            width: 1920,
            height: 1080,
            click_through: ClickThroughStatus {
                desired: true,
                applied: Some(false),
                phase: ClickThroughPhase::Diverged,
                stats: ReconcileStats::default(),
                last_error: Some("Style update failed: denied".to_string()),
                style: None,
            },
        }
    }

    fn run_script(
        script: &str,
        panel: &PanelVisibility,
        save_result: fn() -> Result<PathBuf, PersistenceError>,
    ) -> (ConsoleExit, String, Vec<String>) {
        let (tx, overlay) = fake_overlay(save_result);
        let mut out = Vec::new();
        let exit = run(&tx, panel, Cursor::new(script.to_string()), &mut out);
        drop(tx);
        let seen = overlay.join().unwrap();
        (exit, String::from_utf8(out).unwrap(), seen)
    }

    #[test]
    fn test_run_forwards_updates_and_quits() {
        let panel = PanelVisibility::new(true);
        let (exit, out, seen) = run_script(
            "thickness 3\nclick-through\nquit\nmode dot\n",
            &panel,
            || Ok(PathBuf::from("x.json")),
        );

        assert_eq!(exit, ConsoleExit::Quit);
        assert!(out.starts_with(PROMPT));
        assert_eq!(
            seen,
            vec![
                "Update(Thickness(3))".to_string(),
                "Update(ToggleClickThrough)".to_string(),
                "Shutdown".to_string(),
            ]
        );
    }

    #[test]
    fn test_save_failure_is_reported_even_when_hidden() {
        let panel = PanelVisibility::new(false);
        let (exit, out, _) = run_script("save\n", &panel, || {
            Err(PersistenceError::WriteFile {
                path: PathBuf::from("/nope/settings.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        });

        assert_eq!(exit, ConsoleExit::EndOfInput);
        assert!(!out.contains(PROMPT));
        assert!(out.contains("save failed"));
        assert!(out.contains("denied"));
    }

    #[test]
    fn test_hidden_panel_suppresses_confirmations() {
        let panel = PanelVisibility::new(false);
        let (_, out, _) = run_script("save\n", &panel, || Ok(PathBuf::from("x.json")));
        assert!(out.is_empty());

        let panel = PanelVisibility::new(true);
        let (_, out, _) = run_script("save\n", &panel, || Ok(PathBuf::from("x.json")));
        assert!(out.contains("saved x.json"));
    }

    #[test]
    fn test_status_is_printed() {
        let panel = PanelVisibility::new(true);
        let (_, out, _) = run_script("status\n", &panel, || Ok(PathBuf::from("x.json")));

        assert!(out.contains("mode=cross"));
        assert!(out.contains("desired=on applied=off (diverged)"));
        assert!(out.contains("surface: 1920x1080"));
        assert!(out.contains("(unsaved)"));
        assert!(out.contains("last error: Style update failed: denied"));
    }

    #[test]
    fn test_panel_command_toggles_prompt() {
        let panel = PanelVisibility::new(true);
        let (_, out, _) = run_script("panel\n", &panel, || Ok(PathBuf::from("x.json")));

        assert!(!panel.is_visible());
        assert!(out.contains("panel hidden"));
    }

    #[test]
    fn test_closed_overlay_stops_console() {
        let (tx, rx) = mpsc::channel::<OverlayCommand>(1);
        drop(rx);
        let panel = PanelVisibility::new(true);
        let mut out = Vec::new();

        let exit = run(&tx, &panel, Cursor::new("gap 2\n".to_string()), &mut out);
        assert_eq!(exit, ConsoleExit::OverlayGone);
    }
}
