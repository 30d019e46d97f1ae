//! On-disk encoding of the shortcut stores.
//!
//! `shortcuts.json` holds the flat `name -> command` mapping the `ya` CLI also
//! reads. Everything the CLI does not need lives in `shortcuts-meta.json`.
//! Earlier desktop builds wrote the two halves combined into
//! `shortcuts.json`; [`load_commands`] detects that shape and splits it back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, YaError};
use crate::paths::AppPaths;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub type CommandMap = BTreeMap<String, String>;
pub type MetaMap = BTreeMap<String, ShortcutMeta>;

/// Display-only annotations of a shortcut. Every field is omitted from JSON
/// when it holds its default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutMeta {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub pinned: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_zero"
    )]
    pub run_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
}

impl ShortcutMeta {
    pub fn is_default(&self) -> bool {
        self == &ShortcutMeta::default()
    }
}

/// Legacy combined shape: the command next to its metadata.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RichShortcut {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) command: String,
    #[serde(flatten)]
    pub(crate) meta: ShortcutMeta,
}

/// Result of decoding a commands document in either known shape.
pub(crate) enum DecodedCommands {
    Flat(CommandMap),
    Rich(BTreeMap<String, RichShortcut>),
}

/// `null` reads as the field's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

pub(crate) fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(&UTF8_BOM).unwrap_or(raw)
}

/// Reads a store file, writing `empty` first when the file does not exist.
pub(crate) fn read_or_bootstrap<T: Serialize>(path: &Path, empty: &T) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(raw) => Ok(raw),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "bootstrapping empty store file");
            write_json_file(path, empty)?;
            fs::read(path).map_err(|error| YaError::io(path, error))
        }
        Err(error) => Err(YaError::io(path, error)),
    }
}

/// Whole-file overwrite with pretty JSON and a trailing newline.
pub(crate) fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, format!("{body}\n")).map_err(|error| YaError::io(path, error))?;
    debug!(path = %path.display(), "wrote store file");
    Ok(())
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(strip_bom(raw))
}

/// Flat mapping first, then the rich per-name object.
pub(crate) fn decode_commands(raw: &[u8], file: &Path) -> Result<DecodedCommands> {
    if let Ok(flat) = decode_json::<CommandMap>(raw) {
        return Ok(DecodedCommands::Flat(flat));
    }

    decode_json::<BTreeMap<String, RichShortcut>>(raw)
        .map(DecodedCommands::Rich)
        .map_err(|error| YaError::format(file, error))
}

pub(crate) fn split_rich(rich: BTreeMap<String, RichShortcut>) -> (CommandMap, MetaMap) {
    let mut commands = CommandMap::new();
    let mut meta = MetaMap::new();
    for (name, shortcut) in rich {
        commands.insert(name.clone(), shortcut.command);
        if !shortcut.meta.is_default() {
            meta.insert(name, shortcut.meta);
        }
    }
    (commands, meta)
}

pub fn load_commands(paths: &AppPaths) -> Result<CommandMap> {
    let path = paths.shortcuts_file()?;
    let raw = read_or_bootstrap(&path, &CommandMap::new())?;

    match decode_commands(&raw, &path)? {
        DecodedCommands::Flat(commands) => Ok(commands),
        DecodedCommands::Rich(rich) => {
            info!(
                path = %path.display(),
                entries = rich.len(),
                "migrating combined shortcuts file to split format"
            );
            let (commands, meta) = split_rich(rich);
            if let Err(error) = save_commands(paths, &commands) {
                warn!(%error, "could not rewrite shortcuts file in flat format");
            }
            if let Err(error) = save_meta(paths, &meta) {
                warn!(%error, "could not write migrated shortcut metadata");
            }
            Ok(commands)
        }
    }
}

pub fn save_commands(paths: &AppPaths, commands: &CommandMap) -> Result<()> {
    write_json_file(&paths.shortcuts_file()?, commands)
}

/// Metadata never blocks reading commands: an undecodable file reads as empty.
pub fn load_meta(paths: &AppPaths) -> Result<MetaMap> {
    let path = paths.shortcuts_meta_file()?;
    let raw = read_or_bootstrap(&path, &MetaMap::new())?;

    match decode_json::<MetaMap>(&raw) {
        Ok(meta) => Ok(meta),
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable shortcut metadata");
            Ok(MetaMap::new())
        }
    }
}

pub fn save_meta(paths: &AppPaths, meta: &MetaMap) -> Result<()> {
    let non_default = meta
        .iter()
        .filter(|(_, entry)| !entry.is_default())
        .collect::<BTreeMap<_, _>>();
    write_json_file(&paths.shortcuts_meta_file()?, &non_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths_in(dir: &Path) -> AppPaths {
        AppPaths::new(dir.join("data"))
    }

    #[test]
    fn bootstraps_missing_files_with_empty_objects() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());

        assert!(load_commands(&paths).expect("commands").is_empty());
        assert!(load_meta(&paths).expect("meta").is_empty());

        let on_disk = fs::read_to_string(paths.shortcuts_file().unwrap()).unwrap();
        assert_eq!(on_disk, "{}\n");
        assert!(paths.shortcuts_meta_file().unwrap().is_file());
    }

    #[test]
    fn reads_flat_commands_with_byte_order_mark() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice(br#"{"build": "npm run build"}"#);
        fs::write(paths.shortcuts_file().unwrap(), raw).unwrap();

        let commands = load_commands(&paths).expect("commands");
        assert_eq!(commands.get("build").map(String::as_str), Some("npm run build"));
    }

    #[test]
    fn splits_legacy_rich_shortcuts_file() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        fs::write(
            paths.shortcuts_file().unwrap(),
            r#"{
                "build": {"command": "npm run build", "tags": ["ci"], "pinned": true},
                "plain": {"command": "ls -la"}
            }"#,
        )
        .unwrap();

        let commands = load_commands(&paths).expect("commands");
        assert_eq!(commands.len(), 2);
        assert_eq!(commands["plain"], "ls -la");

        let rewritten = fs::read_to_string(paths.shortcuts_file().unwrap()).unwrap();
        let flat: CommandMap = serde_json::from_str(&rewritten).expect("flat on disk");
        assert_eq!(flat, commands);

        let meta = load_meta(&paths).expect("meta");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["build"].tags, vec!["ci".to_string()]);
        assert!(meta["build"].pinned);
    }

    #[test]
    fn rejects_unknown_commands_shape_naming_the_file() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        fs::write(paths.shortcuts_file().unwrap(), "[1, 2, 3]").unwrap();

        match load_commands(&paths) {
            Err(YaError::Format { file, .. }) => {
                assert!(file.ends_with("shortcuts.json"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn treats_corrupt_metadata_as_empty() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        fs::write(paths.shortcuts_meta_file().unwrap(), "{\"build\": ").unwrap();

        assert!(load_meta(&paths).expect("meta").is_empty());
    }

    #[test]
    fn omits_default_fields_and_entries_from_metadata_file() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        let mut meta = MetaMap::new();
        meta.insert("empty".to_string(), ShortcutMeta::default());
        meta.insert(
            "pinned".to_string(),
            ShortcutMeta {
                pinned: true,
                ..ShortcutMeta::default()
            },
        );
        save_meta(&paths, &meta).expect("save meta");

        let on_disk = fs::read_to_string(paths.shortcuts_meta_file().unwrap()).unwrap();
        assert_eq!(on_disk, "{\n  \"pinned\": {\n    \"pinned\": true\n  }\n}\n");
    }

    #[test]
    fn null_metadata_fields_read_as_defaults() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        fs::write(
            paths.shortcuts_meta_file().unwrap(),
            r#"{"a": {"pinned": true}, "b": {"tags": null, "runCount": null, "description": "x"}}"#,
        )
        .unwrap();

        let meta = load_meta(&paths).expect("meta");
        assert!(meta["a"].pinned);
        assert!(meta["b"].tags.is_empty());
        assert_eq!(meta["b"].run_count, 0);
        assert_eq!(meta["b"].description, "x");
    }

    #[test]
    fn null_fields_in_legacy_rich_file_still_split() {
        let dir = tempdir().expect("tempdir");
        let paths = paths_in(dir.path());
        fs::write(
            paths.shortcuts_file().unwrap(),
            r#"{"b": {"command": "x", "tags": null, "pinned": true, "lastRun": null}}"#,
        )
        .unwrap();

        let commands = load_commands(&paths).expect("commands");
        assert_eq!(commands["b"], "x");
        let meta = load_meta(&paths).expect("meta");
        assert!(meta["b"].pinned);
        assert!(meta["b"].tags.is_empty());
        assert_eq!(meta["b"].last_run, None);
    }
}
