//! Error types for the free space shredder.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shredder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while wiping free space.
///
/// Only [`Error::Config`] is fatal to a run. Everything else is reported per
/// iteration and the wiper moves on to the next unit of work.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid invocation parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Free-space query failed.
    #[error("Free space query failed for {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be created.
    #[error("Failed to open temp file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Buffer allocation failed.
    #[error("Failed to allocate {bytes} bytes")]
    Alloc { bytes: usize },

    /// Cipher operation failed.
    #[error("Encryption error: {0}")]
    Encrypt(String),

    /// Temporary file could not be removed.
    #[error("Failed to remove temp file {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
