use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum YaError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is in an unrecognised format: {source}", .file.display())]
    Format {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No suitable terminal found")]
    NoTerminal,

    #[error("Failed to launch terminal {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No path chosen")]
    NoPathChosen,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No value provided for variable {{{0}}}")]
    MissingVariable(String),

    #[error("Shortcut \"{0}\" does not exist")]
    UnknownShortcut(String),

    #[error("Could not resolve the user configuration directory")]
    NoDataDir,
}

impl YaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YaError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(file: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        YaError::Format {
            file: file.into(),
            source,
        }
    }

    /// A cancelled dialog is reported upward but is not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, YaError::NoPathChosen)
    }
}

pub type Result<T> = std::result::Result<T, YaError>;
