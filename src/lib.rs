pub mod args;
pub mod console;
pub mod hotkeys;
pub mod logging;
pub mod panel;

pub use args::Args;
pub use panel::PanelVisibility;
