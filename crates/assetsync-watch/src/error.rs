//! Error types for the sync engine.

use assetsync_core::{MetadataError, RemoteOperationError, TransformError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning, classifying or running pipelines.
#[derive(Error, Debug)]
pub enum Error {
    /// A directory of the watched tree could not be listed. Fatal at startup.
    #[error("Scan error: cannot list {}: {source}", .path.display())]
    Scan {
        /// Directory that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be read during classification.
    #[error("File read error: {}: {source}", .path.display())]
    FileRead {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Writing a tagged image back to disk failed.
    #[error("File write error: {}: {source}", .path.display())]
    FileWrite {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The identity token could not be embedded.
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// A remote catalog call failed.
    #[error(transparent)]
    Remote(#[from] RemoteOperationError),

    /// The image transform failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// File system watching error.
    #[error("File watching error: {0}")]
    Watch(String),

    /// The watched root is unusable.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for sync engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert notify errors to our error type.
impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err.to_string())
    }
}

impl Error {
    /// Whether the error must abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Scan { .. } | Error::InvalidPath(_))
    }
}
