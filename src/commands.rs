use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tauri::State;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ConfigStore};
use crate::dialogs::NativeDialogs;
use crate::error::Result;
use crate::history::{HistoryLog, RunHistoryEntry};
use crate::paths::AppPaths;
use crate::registry::{filter_shortcuts, sorted_for_display, NamedShortcut, ShortcutRegistry};
use crate::runner::{RunOutcome, ShortcutRunner};
use crate::terminal::TerminalLauncher;
use crate::variables::extract_variables;

pub struct DesktopState {
    paths: AppPaths,
    launcher: TerminalLauncher,
}

impl DesktopState {
    pub fn new(paths: AppPaths, launcher: TerminalLauncher) -> Self {
        Self { paths, launcher }
    }

    fn registry(&self) -> ShortcutRegistry {
        ShortcutRegistry::new(self.paths.clone())
    }

    fn history(&self) -> HistoryLog {
        HistoryLog::new(self.paths.clone())
    }

    fn config(&self) -> ConfigStore {
        ConfigStore::new(self.paths.clone())
    }

    fn runner(&self) -> ShortcutRunner<'_> {
        ShortcutRunner::new(&self.paths, &self.launcher)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShortcutSavePayload {
    name: String,
    command: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShortcutRunPayload {
    name: String,
    directory: Option<String>,
    #[serde(default)]
    values: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedDirectoryPayload {
    name: String,
    path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShortcutsResponse {
    request_id: String,
    ok: bool,
    shortcuts: Vec<NamedShortcut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    imported: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    request_id: String,
    ok: bool,
    entries: Vec<RunHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    request_id: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<AppConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse {
    request_id: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VariablesResponse {
    request_id: String,
    ok: bool,
    variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliExistsResponse {
    request_id: String,
    ok: bool,
    name: String,
    exists: bool,
}

fn request_id() -> String {
    Uuid::new_v4().to_string()
}

/// `(ok, value, cancelled, error)` as carried by every response.
struct Settled<T> {
    ok: bool,
    value: Option<T>,
    cancelled: Option<bool>,
    error: Option<String>,
}

fn settle<T>(command: &str, result: Result<T>) -> Settled<T> {
    match result {
        Ok(value) => Settled {
            ok: true,
            value: Some(value),
            cancelled: None,
            error: None,
        },
        Err(error) if error.is_cancelled() => Settled {
            ok: false,
            value: None,
            cancelled: Some(true),
            error: None,
        },
        Err(error) => {
            warn!(command, %error, "desktop command failed");
            Settled {
                ok: false,
                value: None,
                cancelled: None,
                error: Some(error.to_string()),
            }
        }
    }
}

fn shortcuts_response(
    command: &str,
    result: Result<(Vec<NamedShortcut>, Option<usize>)>,
) -> ShortcutsResponse {
    let settled = settle(command, result);
    let (shortcuts, imported) = settled.value.unwrap_or_default();
    ShortcutsResponse {
        request_id: request_id(),
        ok: settled.ok,
        shortcuts,
        imported,
        cancelled: settled.cancelled,
        error: settled.error,
    }
}

fn history_response(command: &str, result: Result<Vec<RunHistoryEntry>>) -> HistoryResponse {
    let settled = settle(command, result);
    HistoryResponse {
        request_id: request_id(),
        ok: settled.ok,
        entries: settled.value.unwrap_or_default(),
        error: settled.error,
    }
}

fn config_response(command: &str, result: Result<AppConfig>) -> ConfigResponse {
    let settled = settle(command, result);
    ConfigResponse {
        request_id: request_id(),
        ok: settled.ok,
        config: settled.value,
        error: settled.error,
    }
}

fn listed(registry: &ShortcutRegistry) -> Result<(Vec<NamedShortcut>, Option<usize>)> {
    Ok((registry.list()?, None))
}

#[tauri::command]
fn shortcuts_get(state: State<'_, DesktopState>, query: Option<String>) -> ShortcutsResponse {
    let result = state.registry().list().map(|rows| {
        let rows = match query.as_deref() {
            Some(query) => filter_shortcuts(&rows, query),
            None => rows,
        };
        (rows, None)
    });
    shortcuts_response("shortcuts_get", result)
}

#[tauri::command]
fn shortcut_save(
    state: State<'_, DesktopState>,
    payload: ShortcutSavePayload,
) -> ShortcutsResponse {
    let registry = state.registry();
    let result = registry
        .add_or_update(
            &payload.name,
            &payload.command,
            &payload.description,
            &payload.tags,
        )
        .and_then(|_| listed(&registry));
    shortcuts_response("shortcut_save", result)
}

#[tauri::command]
fn shortcut_remove(state: State<'_, DesktopState>, name: String) -> ShortcutsResponse {
    let registry = state.registry();
    let result = registry.remove(&name).and_then(|_| listed(&registry));
    shortcuts_response("shortcut_remove", result)
}

#[tauri::command]
fn shortcut_toggle_pin(state: State<'_, DesktopState>, name: String) -> ShortcutsResponse {
    let registry = state.registry();
    let result = registry.toggle_pin(&name).and_then(|_| listed(&registry));
    shortcuts_response("shortcut_toggle_pin", result)
}

#[tauri::command]
fn shortcut_duplicate(state: State<'_, DesktopState>, name: String) -> ShortcutsResponse {
    let result = state
        .registry()
        .duplicate(&name)
        .map(|shortcuts| (sorted_for_display(shortcuts), None));
    shortcuts_response("shortcut_duplicate", result)
}

#[tauri::command]
fn shortcuts_export(state: State<'_, DesktopState>) -> ShortcutsResponse {
    let registry = state.registry();
    let result = registry
        .export_with_dialog(&NativeDialogs)
        .and_then(|_| listed(&registry));
    shortcuts_response("shortcuts_export", result)
}

#[tauri::command]
fn shortcuts_import(state: State<'_, DesktopState>) -> ShortcutsResponse {
    let registry = state.registry();
    let result = registry
        .import_with_dialog(&NativeDialogs)
        .and_then(|count| Ok((registry.list()?, Some(count))));
    shortcuts_response("shortcuts_import", result)
}

#[tauri::command]
fn shortcut_run(state: State<'_, DesktopState>, payload: ShortcutRunPayload) -> RunResponse {
    let runner = state.runner();
    let directory = payload
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty());
    let result = state.config().get().and_then(|config| match directory {
        Some(directory) => {
            runner.run_shortcut(&config, &payload.name, Path::new(directory), &payload.values)
        }
        None => {
            runner.pick_directory_and_run(&NativeDialogs, &config, &payload.name, &payload.values)
        }
    });

    let settled = settle("shortcut_run", result);
    RunResponse {
        request_id: request_id(),
        ok: settled.ok,
        run: settled.value,
        cancelled: settled.cancelled,
        error: settled.error,
    }
}

#[tauri::command]
fn command_variables(command: String) -> VariablesResponse {
    VariablesResponse {
        request_id: request_id(),
        ok: true,
        variables: extract_variables(&command),
    }
}

#[tauri::command]
fn history_get(state: State<'_, DesktopState>) -> HistoryResponse {
    history_response("history_get", state.history().get_all())
}

#[tauri::command]
fn history_clear(state: State<'_, DesktopState>) -> HistoryResponse {
    let history = state.history();
    let result = history.clear().map(|_| Vec::new());
    history_response("history_clear", result)
}

#[tauri::command]
fn config_get(state: State<'_, DesktopState>) -> ConfigResponse {
    config_response("config_get", state.config().get())
}

#[tauri::command]
fn config_set_preferred_terminal(
    state: State<'_, DesktopState>,
    preferred_terminal: String,
) -> ConfigResponse {
    let result = state
        .config()
        .set_preferred_terminal_named(&preferred_terminal);
    config_response("config_set_preferred_terminal", result)
}

#[tauri::command]
fn config_set_start_on_boot(state: State<'_, DesktopState>, enabled: bool) -> ConfigResponse {
    config_response(
        "config_set_start_on_boot",
        state.config().set_start_on_boot(enabled),
    )
}

#[tauri::command]
fn config_add_saved_directory(
    state: State<'_, DesktopState>,
    payload: SavedDirectoryPayload,
) -> ConfigResponse {
    let result = state
        .config()
        .add_saved_directory(&payload.name, &payload.path);
    config_response("config_add_saved_directory", result)
}

#[tauri::command]
fn config_remove_saved_directory(state: State<'_, DesktopState>, name: String) -> ConfigResponse {
    config_response(
        "config_remove_saved_directory",
        state.config().remove_saved_directory(&name),
    )
}

#[tauri::command]
fn cli_exists(state: State<'_, DesktopState>, name: String) -> CliExistsResponse {
    let exists = state.launcher.cli_exists(name.trim());
    CliExistsResponse {
        request_id: request_id(),
        ok: true,
        name,
        exists,
    }
}

pub fn run() -> std::result::Result<(), String> {
    let paths = AppPaths::discover().map_err(|error| error.to_string())?;
    info!(data_dir = %paths.data_dir().display(), "using data directory");
    let state = DesktopState::new(paths, TerminalLauncher::system());

    tauri::Builder::default()
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            shortcuts_get,
            shortcut_save,
            shortcut_remove,
            shortcut_toggle_pin,
            shortcut_duplicate,
            shortcuts_export,
            shortcuts_import,
            shortcut_run,
            command_variables,
            history_get,
            history_clear,
            config_get,
            config_set_preferred_terminal,
            config_set_start_on_boot,
            config_add_saved_directory,
            config_remove_saved_directory,
            cli_exists,
        ])
        .run(tauri::generate_context!())
        .map_err(|error| format!("Failed to run the desktop app: {error}"))
}
