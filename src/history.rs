use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::codec;
use crate::error::{Result, YaError};
use crate::paths::AppPaths;
use crate::timestamp::now_iso;

pub const MAX_HISTORY_ENTRIES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHistoryEntry {
    pub shortcut_name: String,
    pub command: String,
    pub directory: String,
    pub timestamp: String,
}

/// `history.json`, stored oldest first and capped at [`MAX_HISTORY_ENTRIES`].
#[derive(Debug, Clone)]
pub struct HistoryLog {
    paths: AppPaths,
}

impl HistoryLog {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    fn load(&self) -> Result<(PathBuf, Vec<RunHistoryEntry>)> {
        let path = self.paths.history_file()?;
        let raw = codec::read_or_bootstrap(&path, &Vec::<RunHistoryEntry>::new())?;
        let entries = codec::decode_json(&raw).map_err(|error| YaError::format(&path, error))?;
        Ok((path, entries))
    }

    pub fn append(&self, shortcut_name: &str, command: &str, directory: &str) -> Result<()> {
        let (path, mut entries) = self.load()?;
        entries.push(RunHistoryEntry {
            shortcut_name: shortcut_name.to_string(),
            command: command.to_string(),
            directory: directory.to_string(),
            timestamp: now_iso(),
        });
        if entries.len() > MAX_HISTORY_ENTRIES {
            let overflow = entries.len() - MAX_HISTORY_ENTRIES;
            entries.drain(..overflow);
        }
        codec::write_json_file(&path, &entries)?;
        debug!(shortcut_name, entries = entries.len(), "recorded run");
        Ok(())
    }

    /// Newest first.
    pub fn get_all(&self) -> Result<Vec<RunHistoryEntry>> {
        let (_, mut entries) = self.load()?;
        entries.reverse();
        Ok(entries)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.paths.history_file()?;
        codec::write_json_file(&path, &Vec::<RunHistoryEntry>::new())
    }
}
