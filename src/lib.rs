mod codec;
pub mod config;
pub mod dialogs;
pub mod error;
pub mod history;
pub mod paths;
pub mod registry;
pub mod runner;
pub mod terminal;
mod timestamp;
pub mod variables;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod logging;

pub use codec::ShortcutMeta;
pub use config::{AppConfig, ConfigStore, PreferredTerminal, SavedDir};
pub use dialogs::PathChooser;
pub use error::{Result, YaError};
pub use history::{HistoryLog, RunHistoryEntry, MAX_HISTORY_ENTRIES};
pub use paths::AppPaths;
pub use registry::{NamedShortcut, Shortcut, ShortcutMap, ShortcutRegistry};
pub use runner::{RunOutcome, ShortcutRunner};
pub use terminal::{LaunchedTerminal, TerminalLauncher};
pub use variables::{extract_variables, substitute_variables};

#[cfg(feature = "desktop")]
pub fn run() -> std::result::Result<(), String> {
    logging::init();
    commands::run()
}
