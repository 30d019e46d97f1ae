use std::path::{Path, PathBuf};

use crate::error::{Result, YaError};

/// Native file and folder pickers. `None` means the user cancelled.
pub trait PathChooser: Send + Sync {
    fn pick_directory(&self, title: &str, start: Option<&Path>) -> Option<PathBuf>;
    fn pick_open_file(&self, title: &str) -> Option<PathBuf>;
    fn pick_save_file(&self, title: &str, default_file_name: &str) -> Option<PathBuf>;
}

/// Maps a cancelled (or empty) pick to [`YaError::NoPathChosen`].
pub(crate) fn chosen(picked: Option<PathBuf>) -> Result<PathBuf> {
    picked
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or(YaError::NoPathChosen)
}

#[cfg(feature = "desktop")]
pub use native::NativeDialogs;

#[cfg(feature = "desktop")]
mod native {
    use super::PathChooser;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeDialogs;

    impl PathChooser for NativeDialogs {
        fn pick_directory(&self, title: &str, start: Option<&Path>) -> Option<PathBuf> {
            let mut dialog = rfd::FileDialog::new().set_title(title);
            if let Some(start) = start.filter(|path| path.is_dir()) {
                dialog = dialog.set_directory(start);
            }
            dialog.pick_folder()
        }

        fn pick_open_file(&self, title: &str) -> Option<PathBuf> {
            rfd::FileDialog::new()
                .set_title(title)
                .add_filter("JSON Files", &["json"])
                .pick_file()
        }

        fn pick_save_file(&self, title: &str, default_file_name: &str) -> Option<PathBuf> {
            rfd::FileDialog::new()
                .set_title(title)
                .set_file_name(default_file_name)
                .add_filter("JSON Files", &["json"])
                .save_file()
        }
    }
}
