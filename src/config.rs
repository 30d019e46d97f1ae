use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::codec;
use crate::error::{Result, YaError};
use crate::paths::AppPaths;

const SUPPORTED_PREFERRED_TERMINALS: [&str; 5] = ["auto", "wt", "powershell", "cmd", "bash"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum PreferredTerminal {
    #[default]
    Auto,
    Wt,
    Powershell,
    Cmd,
    Bash,
}

impl PreferredTerminal {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferredTerminal::Auto => "auto",
            PreferredTerminal::Wt => "wt",
            PreferredTerminal::Powershell => "powershell",
            PreferredTerminal::Cmd => "cmd",
            PreferredTerminal::Bash => "bash",
        }
    }

    /// Strict parse for user input; blank means `auto`.
    pub fn normalize(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "" | "auto" => Ok(PreferredTerminal::Auto),
            "wt" => Ok(PreferredTerminal::Wt),
            "powershell" => Ok(PreferredTerminal::Powershell),
            "cmd" => Ok(PreferredTerminal::Cmd),
            "bash" => Ok(PreferredTerminal::Bash),
            _ => Err(YaError::InvalidInput(format!(
                "preferredTerminal must be one of: {}.",
                SUPPORTED_PREFERRED_TERMINALS.join(", ")
            ))),
        }
    }
}

/// Stored values the app no longer knows read as `auto`.
impl From<String> for PreferredTerminal {
    fn from(value: String) -> Self {
        PreferredTerminal::normalize(&value).unwrap_or_default()
    }
}

impl From<PreferredTerminal> for String {
    fn from(value: PreferredTerminal) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PreferredTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDir {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dir: Option<String>,
    #[serde(default)]
    pub preferred_terminal: PreferredTerminal,
    #[serde(default, skip_serializing_if = "is_false")]
    pub start_on_boot: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saved_directories: Vec<SavedDir>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl AppConfig {
    /// Last write wins for an existing name.
    pub fn upsert_saved_directory(&mut self, name: &str, path: &str) {
        if let Some(existing) = self
            .saved_directories
            .iter_mut()
            .find(|saved| saved.name == name)
        {
            existing.path = path.to_string();
            return;
        }
        self.saved_directories.push(SavedDir {
            name: name.to_string(),
            path: path.to_string(),
        });
    }

    pub fn remove_saved_directory(&mut self, name: &str) {
        self.saved_directories.retain(|saved| saved.name != name);
    }

    pub fn default_dir_path(&self) -> Option<PathBuf> {
        self.default_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }

    /// Only `defaultDir` carried meaning in the old flat string map.
    fn from_legacy(legacy: &BTreeMap<String, String>) -> Self {
        Self {
            default_dir: legacy
                .get("defaultDir")
                .filter(|dir| !dir.trim().is_empty())
                .cloned(),
            ..Self::default()
        }
    }
}

/// `config.json` in the app data directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: AppPaths,
}

impl ConfigStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    pub fn get(&self) -> Result<AppConfig> {
        let path = self.paths.config_file()?;
        let raw = codec::read_or_bootstrap(&path, &AppConfig::default())?;

        if let Ok(config) = codec::decode_json::<AppConfig>(&raw) {
            return Ok(config);
        }

        let legacy = codec::decode_json::<BTreeMap<String, String>>(&raw)
            .map_err(|error| YaError::format(&path, error))?;
        let config = AppConfig::from_legacy(&legacy);
        info!(path = %path.display(), "upgrading legacy config format");
        self.save(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        codec::write_json_file(&self.paths.config_file()?, config)
    }

    fn update(&self, apply: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
        let mut config = self.get()?;
        apply(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    pub fn update_default_dir(&self, dir: &str) -> Result<AppConfig> {
        debug!(dir, "remembering default directory");
        self.update(|config| config.default_dir = Some(dir.to_string()))
    }

    pub fn set_preferred_terminal(&self, terminal: PreferredTerminal) -> Result<AppConfig> {
        self.update(|config| config.preferred_terminal = terminal)
    }

    pub fn set_preferred_terminal_named(&self, terminal: &str) -> Result<AppConfig> {
        self.set_preferred_terminal(PreferredTerminal::normalize(terminal)?)
    }

    /// Persists the flag only; registering with the OS login items is not done here.
    pub fn set_start_on_boot(&self, enabled: bool) -> Result<AppConfig> {
        self.update(|config| config.start_on_boot = enabled)
    }

    pub fn add_saved_directory(&self, name: &str, path: &str) -> Result<AppConfig> {
        if name.trim().is_empty() || path.trim().is_empty() {
            return Err(YaError::InvalidInput(
                "Saved directories need a non-empty name and path.".to_string(),
            ));
        }
        self.update(|config| config.upsert_saved_directory(name, path))
    }

    pub fn remove_saved_directory(&self, name: &str) -> Result<AppConfig> {
        self.update(|config| config.remove_saved_directory(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn store() -> (TempDir, ConfigStore) {
        let dir = tempdir().expect("tempdir");
        let store = ConfigStore::new(AppPaths::new(dir.path().join("data")));
        (dir, store)
    }

    fn config_on_disk(store: &ConfigStore) -> String {
        fs::read_to_string(store.paths.config_file().unwrap()).unwrap()
    }

    #[test]
    fn bootstraps_auto_terminal_config() {
        let (_dir, store) = store();
        let config = store.get().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config_on_disk(&store), "{\n  \"preferredTerminal\": \"auto\"\n}\n");
    }

    #[test]
    fn upgrades_legacy_flat_string_map() {
        let (_dir, store) = store();
        fs::write(
            store.paths.config_file().unwrap(),
            r#"{"defaultDir": "/home/me/src", "startOnBoot": "yes"}"#,
        )
        .unwrap();

        let config = store.get().unwrap();
        assert_eq!(config.default_dir.as_deref(), Some("/home/me/src"));
        assert_eq!(config.preferred_terminal, PreferredTerminal::Auto);
        assert!(!config.start_on_boot);

        let upgraded: serde_json::Value = serde_json::from_str(&config_on_disk(&store)).unwrap();
        assert_eq!(upgraded["defaultDir"], "/home/me/src");
        assert_eq!(upgraded["preferredTerminal"], "auto");
        assert!(upgraded.get("startOnBoot").is_none());
    }

    #[test]
    fn rejects_undecodable_config() {
        let (_dir, store) = store();
        fs::write(store.paths.config_file().unwrap(), "[\"nope\"]").unwrap();
        assert!(matches!(store.get(), Err(YaError::Format { .. })));
    }

    #[test]
    fn unknown_stored_terminal_reads_as_auto() {
        let (_dir, store) = store();
        fs::write(
            store.paths.config_file().unwrap(),
            r#"{"preferredTerminal": "alacritty"}"#,
        )
        .unwrap();
        assert_eq!(store.get().unwrap().preferred_terminal, PreferredTerminal::Auto);
    }

    #[test]
    fn normalizes_preferred_terminal_case_and_spacing() {
        assert_eq!(
            PreferredTerminal::normalize("  PowerShell ").unwrap(),
            PreferredTerminal::Powershell
        );
        assert!(PreferredTerminal::normalize("kitty").is_err());
        assert_eq!(PreferredTerminal::Powershell.to_string(), "powershell");

        let (_dir, store) = store();
        let config = store.set_preferred_terminal_named("BASH").unwrap();
        assert_eq!(config.preferred_terminal, PreferredTerminal::Bash);
        assert_eq!(store.get().unwrap().preferred_terminal, PreferredTerminal::Bash);
    }

    #[test]
    fn saved_directories_last_write_wins_and_remove_by_name() {
        let (_dir, store) = store();
        store.add_saved_directory("work", "/srv/work").unwrap();
        store.add_saved_directory("home", "/home/me").unwrap();
        store.add_saved_directory("work", "/srv/work-2").unwrap();

        let config = store.get().unwrap();
        assert_eq!(
            config.saved_directories,
            vec![
                SavedDir {
                    name: "work".to_string(),
                    path: "/srv/work-2".to_string()
                },
                SavedDir {
                    name: "home".to_string(),
                    path: "/home/me".to_string()
                },
            ]
        );

        store.remove_saved_directory("work").unwrap();
        store.remove_saved_directory("missing").unwrap();
        let names = store
            .get()
            .unwrap()
            .saved_directories
            .into_iter()
            .map(|saved| saved.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["home"]);
    }

    #[test]
    fn persists_default_dir_and_start_on_boot() {
        let (_dir, store) = store();
        store.update_default_dir("/repo").unwrap();
        store.set_start_on_boot(true).unwrap();

        let config = store.get().unwrap();
        assert_eq!(config.default_dir_path(), Some(PathBuf::from("/repo")));
        assert!(config.start_on_boot);
    }
}
