//! Error types for settings persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or writing the settings file
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed, but some keys held unusable values and were replaced by defaults
    #[error("ignored invalid values for {} in {path}", keys.join(", "))]
    InvalidValues { path: PathBuf, keys: Vec<String> },

    #[error("failed to serialize settings")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    /// True when the settings file simply does not exist yet
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            PersistenceError::ReadFile { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
