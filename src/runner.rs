use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::config::{AppConfig, ConfigStore};
use crate::dialogs::{self, PathChooser};
use crate::error::{Result, YaError};
use crate::history::HistoryLog;
use crate::paths::AppPaths;
use crate::registry::ShortcutRegistry;
use crate::terminal::{LaunchedTerminal, TerminalLauncher};
use crate::variables::substitute_variables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_name: Option<String>,
    pub command: String,
    pub launched: LaunchedTerminal,
}

/// Launches shortcuts in a terminal and records each successful run.
pub struct ShortcutRunner<'a> {
    launcher: &'a TerminalLauncher,
    registry: ShortcutRegistry,
    history: HistoryLog,
    config: ConfigStore,
}

fn require_directory(directory: &Path) -> Result<()> {
    if directory.as_os_str().is_empty() {
        return Err(YaError::InvalidInput(
            "A working directory is required to run a command.".to_string(),
        ));
    }
    Ok(())
}

impl<'a> ShortcutRunner<'a> {
    pub fn new(paths: &AppPaths, launcher: &'a TerminalLauncher) -> Self {
        Self {
            launcher,
            registry: ShortcutRegistry::new(paths.clone()),
            history: HistoryLog::new(paths.clone()),
            config: ConfigStore::new(paths.clone()),
        }
    }

    /// History, run count and `defaultDir` are only touched once the
    /// terminal has started.
    pub fn run_shortcut(
        &self,
        config: &AppConfig,
        name: &str,
        directory: &Path,
        values: &HashMap<String, String>,
    ) -> Result<RunOutcome> {
        require_directory(directory)?;
        let shortcut = self
            .registry
            .find(name)?
            .ok_or_else(|| YaError::UnknownShortcut(name.to_string()))?;
        let command = substitute_variables(&shortcut.command, values)?;

        let launched = self
            .launcher
            .launch(&command, directory, config.preferred_terminal)?;

        let directory_text = directory.display().to_string();
        self.history.append(name, &command, &directory_text)?;
        self.registry.increment_run_count(name)?;
        self.config.update_default_dir(&directory_text)?;
        info!(name, "ran shortcut");

        Ok(RunOutcome {
            shortcut_name: Some(name.to_string()),
            command,
            launched,
        })
    }

    /// Ad-hoc command, no bookkeeping.
    pub fn run_command(
        &self,
        config: &AppConfig,
        command: &str,
        directory: &Path,
    ) -> Result<RunOutcome> {
        require_directory(directory)?;
        if command.trim().is_empty() {
            return Err(YaError::InvalidInput("Command must not be empty.".to_string()));
        }
        let launched = self
            .launcher
            .launch(command, directory, config.preferred_terminal)?;
        Ok(RunOutcome {
            shortcut_name: None,
            command: command.to_string(),
            launched,
        })
    }

    pub fn pick_directory_and_run(
        &self,
        chooser: &dyn PathChooser,
        config: &AppConfig,
        name: &str,
        values: &HashMap<String, String>,
    ) -> Result<RunOutcome> {
        let start = config.default_dir_path();
        let directory = dialogs::chosen(
            chooser.pick_directory(&format!("Run \"{name}\" in..."), start.as_deref()),
        )?;
        self.run_shortcut(config, name, &directory, values)
    }
}
