//! Error types for the `synckit` binary.

use std::io;
use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end a `synckit` invocation with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Root validation or traversal failure from the mirror engine
    #[error(transparent)]
    Sync(#[from] synckit_mirror::SyncError),

    #[error("failed to read settings {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write settings {}: {source}", path.display())]
    SettingsWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
