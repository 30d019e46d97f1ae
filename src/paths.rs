use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, YaError};

pub const SHORTCUTS_FILE: &str = "shortcuts.json";
pub const SHORTCUTS_META_FILE: &str = "shortcuts-meta.json";
pub const CONFIG_FILE: &str = "config.json";
pub const HISTORY_FILE: &str = "history.json";

/// Overrides the data directory, e.g. for a portable install.
pub const DATA_DIR_ENV: &str = "YA_DATA_DIR";

/// Location of the per-user data directory shared with the `ya` CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolves `<user config dir>/ya/data`, honouring `YA_DATA_DIR` first.
    pub fn discover() -> Result<Self> {
        if let Some(from_env) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(from_env));
        }

        let config_dir = dirs::config_dir().ok_or(YaError::NoDataDir)?;
        Ok(Self::new(config_dir.join("ya").join("data")))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn shortcuts_file(&self) -> Result<PathBuf> {
        self.store_file(SHORTCUTS_FILE)
    }

    pub fn shortcuts_meta_file(&self) -> Result<PathBuf> {
        self.store_file(SHORTCUTS_META_FILE)
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        self.store_file(CONFIG_FILE)
    }

    pub fn history_file(&self) -> Result<PathBuf> {
        self.store_file(HISTORY_FILE)
    }

    fn store_file(&self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir).map_err(|error| YaError::io(&self.data_dir, error))?;
        Ok(self.data_dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn creates_data_directory_on_first_file_lookup() {
        let dir = tempdir().expect("tempdir");
        let data_dir = dir.path().join("nested").join("data");
        let paths = AppPaths::new(&data_dir);
        assert!(!data_dir.exists());

        let shortcuts = paths.shortcuts_file().expect("shortcuts file");
        assert!(data_dir.is_dir());
        assert_eq!(shortcuts, data_dir.join("shortcuts.json"));
        assert_eq!(
            paths.history_file().expect("history file"),
            data_dir.join("history.json")
        );
    }

    #[test]
    fn reports_uncreatable_directory_as_io_error() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("write blocker");

        let paths = AppPaths::new(blocker.join("data"));
        assert!(matches!(paths.config_file(), Err(YaError::Io { .. })));
    }

    #[test]
    fn data_dir_env_var_overrides_config_dir() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = tempdir().expect("tempdir");
        let portable = dir.path().join("portable");
        std::env::set_var(DATA_DIR_ENV, &portable);

        let discovered = AppPaths::discover();
        std::env::remove_var(DATA_DIR_ENV);

        assert_eq!(discovered.expect("discover").data_dir(), portable.as_path());
    }

    #[test]
    fn discovers_ya_data_under_user_config_dir() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::env::set_var(DATA_DIR_ENV, "");

        let discovered = AppPaths::discover();
        std::env::remove_var(DATA_DIR_ENV);

        match dirs::config_dir() {
            Some(config_dir) => assert_eq!(
                discovered.expect("discover").data_dir(),
                config_dir.join("ya").join("data").as_path()
            ),
            None => assert!(matches!(discovered, Err(YaError::NoDataDir))),
        }
    }
}
