use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::codec::{self, CommandMap, DecodedCommands, MetaMap, ShortcutMeta};
use crate::dialogs::{self, PathChooser};
use crate::error::{Result, YaError};
use crate::paths::AppPaths;
use crate::timestamp::now_iso;

pub type ShortcutMap = BTreeMap<String, Shortcut>;

/// A command merged with its metadata. The name is the map key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    pub command: String,
    pub description: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub run_count: u64,
    pub last_run: Option<String>,
}

impl Shortcut {
    fn from_parts(command: String, meta: ShortcutMeta) -> Self {
        Self {
            command,
            description: meta.description,
            tags: meta.tags,
            pinned: meta.pinned,
            run_count: meta.run_count,
            last_run: meta.last_run,
        }
    }

    fn meta(&self) -> ShortcutMeta {
        ShortcutMeta {
            description: self.description.clone(),
            tags: self.tags.clone(),
            pinned: self.pinned,
            run_count: self.run_count,
            last_run: self.last_run.clone(),
        }
    }

    fn matches(&self, name: &str, needle: &str) -> bool {
        name.to_lowercase().contains(needle)
            || self.command.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedShortcut {
    pub name: String,
    #[serde(flatten)]
    pub shortcut: Shortcut,
}

/// Splits a comma-separated tag list, trimming pieces and dropping empty ones.
pub fn parse_tags(tags_csv: &str) -> Vec<String> {
    tags_csv
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Pinned shortcuts first, then by name.
pub fn sorted_for_display(shortcuts: ShortcutMap) -> Vec<NamedShortcut> {
    let mut rows = shortcuts
        .into_iter()
        .map(|(name, shortcut)| NamedShortcut { name, shortcut })
        .collect::<Vec<_>>();
    rows.sort_by(|left, right| {
        right
            .shortcut
            .pinned
            .cmp(&left.shortcut.pinned)
            .then_with(|| left.name.cmp(&right.name))
    });
    rows
}

/// Case-insensitive search over name, command, description and tags.
pub fn filter_shortcuts(rows: &[NamedShortcut], query: &str) -> Vec<NamedShortcut> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|row| needle.is_empty() || row.shortcut.matches(&row.name, &needle))
        .cloned()
        .collect()
}

fn duplicate_name(shortcuts: &ShortcutMap, name: &str) -> String {
    let mut candidate = format!("{name} (copy)");
    let mut suffix = 2u32;
    while shortcuts.contains_key(&candidate) {
        candidate = format!("{name} (copy {suffix})");
        suffix += 1;
    }
    candidate
}

fn validate_shortcut_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(YaError::InvalidInput(
            "Shortcut name must be a non-empty string.".to_string(),
        ));
    }
    Ok(())
}

/// Merged view over `shortcuts.json` and `shortcuts-meta.json`. Nothing is
/// cached: every call reloads both files and mutations rewrite them whole.
#[derive(Debug, Clone)]
pub struct ShortcutRegistry {
    paths: AppPaths,
}

impl ShortcutRegistry {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    fn load(&self) -> Result<ShortcutMap> {
        let commands = codec::load_commands(&self.paths)?;
        let mut meta = codec::load_meta(&self.paths)?;
        Ok(commands
            .into_iter()
            .map(|(name, command)| {
                let entry_meta = meta.remove(&name).unwrap_or_default();
                (name, Shortcut::from_parts(command, entry_meta))
            })
            .collect())
    }

    fn save(&self, shortcuts: &ShortcutMap) -> Result<()> {
        let commands = shortcuts
            .iter()
            .map(|(name, shortcut)| (name.clone(), shortcut.command.clone()))
            .collect::<CommandMap>();
        let meta = shortcuts
            .iter()
            .map(|(name, shortcut)| (name.clone(), shortcut.meta()))
            .filter(|(_, entry)| !entry.is_default())
            .collect::<MetaMap>();

        codec::save_commands(&self.paths, &commands)?;
        codec::save_meta(&self.paths, &meta)
    }

    pub fn get(&self) -> Result<ShortcutMap> {
        self.load()
    }

    pub fn list(&self) -> Result<Vec<NamedShortcut>> {
        self.load().map(sorted_for_display)
    }

    pub fn find(&self, name: &str) -> Result<Option<Shortcut>> {
        Ok(self.load()?.remove(name))
    }

    /// Creates or replaces a shortcut, keeping its pin and run statistics.
    pub fn add_or_update(
        &self,
        name: &str,
        command: &str,
        description: &str,
        tags_csv: &str,
    ) -> Result<()> {
        validate_shortcut_name(name)?;
        let mut shortcuts = self.load()?;
        let existing = shortcuts.remove(name).unwrap_or_default();
        shortcuts.insert(
            name.to_string(),
            Shortcut {
                command: command.to_string(),
                description: description.to_string(),
                tags: parse_tags(tags_csv),
                ..existing
            },
        );
        self.save(&shortcuts)?;
        debug!(name, "saved shortcut");
        Ok(())
    }

    /// Absent names leave both files untouched.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut shortcuts = self.load()?;
        if shortcuts.remove(name).is_none() {
            return Ok(());
        }
        self.save(&shortcuts)?;
        debug!(name, "removed shortcut");
        Ok(())
    }

    pub fn toggle_pin(&self, name: &str) -> Result<()> {
        let mut shortcuts = self.load()?;
        let Some(shortcut) = shortcuts.get_mut(name) else {
            return Ok(());
        };
        shortcut.pinned = !shortcut.pinned;
        self.save(&shortcuts)
    }

    /// Copies command, description and tags under the first free
    /// `"<name> (copy)"`, `"<name> (copy 2)"`, ... name.
    pub fn duplicate(&self, name: &str) -> Result<ShortcutMap> {
        let mut shortcuts = self.load()?;
        let Some(source) = shortcuts.get(name) else {
            return Ok(shortcuts);
        };

        let copy = Shortcut {
            command: source.command.clone(),
            description: source.description.clone(),
            tags: source.tags.clone(),
            ..Shortcut::default()
        };
        let copy_name = duplicate_name(&shortcuts, name);
        shortcuts.insert(copy_name.clone(), copy);
        self.save(&shortcuts)?;
        debug!(name, copy = %copy_name, "duplicated shortcut");
        Ok(shortcuts)
    }

    pub fn increment_run_count(&self, name: &str) -> Result<()> {
        let mut shortcuts = self.load()?;
        let Some(shortcut) = shortcuts.get_mut(name) else {
            return Ok(());
        };
        shortcut.run_count += 1;
        shortcut.last_run = Some(now_iso());
        self.save(&shortcuts)
    }

    /// Copies the canonical `shortcuts.json` verbatim to `destination`.
    pub fn export(&self, destination: &Path) -> Result<()> {
        // Loading first bootstraps a missing file and flattens a legacy one.
        codec::load_commands(&self.paths)?;
        let source = self.paths.shortcuts_file()?;
        let raw = fs::read(&source).map_err(|error| YaError::io(&source, error))?;
        fs::write(destination, raw).map_err(|error| YaError::io(destination, error))?;
        info!(destination = %destination.display(), "exported shortcuts");
        Ok(())
    }

    /// Merges commands from `source`. Existing names only get their command
    /// replaced; metadata carried by a rich-format file is discarded.
    pub fn import(&self, source: &Path) -> Result<usize> {
        let raw = fs::read(source).map_err(|error| YaError::io(source, error))?;
        let imported = match codec::decode_commands(&raw, source)? {
            DecodedCommands::Flat(commands) => commands,
            DecodedCommands::Rich(rich) => rich
                .into_iter()
                .map(|(name, shortcut)| (name, shortcut.command))
                .collect(),
        };

        let mut shortcuts = self.load()?;
        let count = imported.len();
        for (name, command) in imported {
            shortcuts.entry(name).or_default().command = command;
        }
        self.save(&shortcuts)?;
        info!(source = %source.display(), count, "imported shortcuts");
        Ok(count)
    }

    pub fn export_with_dialog(&self, chooser: &dyn PathChooser) -> Result<()> {
        let destination =
            dialogs::chosen(chooser.pick_save_file("Export Shortcuts", "shortcuts.json"))?;
        self.export(&destination)
    }

    pub fn import_with_dialog(&self, chooser: &dyn PathChooser) -> Result<usize> {
        let source = dialogs::chosen(chooser.pick_open_file("Import Shortcuts"))?;
        self.import(&source)
    }
}
