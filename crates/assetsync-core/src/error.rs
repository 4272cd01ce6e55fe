//! Error types shared across the workspace.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the metadata block that carries the identity token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The buffer does not start with a JPEG SOI marker.
    #[error("not a JPEG image")]
    NotJpeg,

    /// A segment header or length ran past the end of the buffer.
    #[error("truncated JPEG segment at offset {0}")]
    Truncated(usize),

    /// The TIFF body inside the EXIF segment is malformed.
    #[error("malformed EXIF block: {0}")]
    Malformed(String),

    /// The token cannot be stored in the field.
    #[error("invalid identity token: {0}")]
    InvalidToken(String),

    /// The rebuilt EXIF segment exceeds the JPEG segment size limit.
    #[error("EXIF segment too large ({0} bytes)")]
    SegmentTooLarge(usize),
}

/// Remote catalog operation kinds, used for error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteAction {
    /// Listing all known records.
    List,
    /// Creating a new record.
    Create,
    /// Renaming a record.
    UpdateName,
    /// Deleting a record.
    Delete,
    /// Uploading the asset payload of a record.
    Upload,
}

impl RemoteAction {
    /// Short name used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::UpdateName => "update-name",
            Self::Delete => "delete",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote catalog call failed.
///
/// `target` is the identity token or file name the call was about, so that a
/// logged failure tells the operator which file to touch to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote {action} failed for '{target}': {message}")]
pub struct RemoteOperationError {
    /// Operation that failed.
    pub action: RemoteAction,
    /// Identity token or file name involved.
    pub target: String,
    /// Human readable cause.
    pub message: String,
}

impl RemoteOperationError {
    /// Create a new remote operation error.
    pub fn new(action: RemoteAction, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            message: message.into(),
        }
    }
}

/// The image transform collaborator failed.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Reading the source or writing the generated copy failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Decoding or encoding pixels failed.
    #[error("image codec error on {path}: {message}")]
    Codec {
        /// File involved.
        path: PathBuf,
        /// Codec message.
        message: String,
    },

    /// The blocking worker was cancelled or panicked.
    #[error("transform task failed: {0}")]
    Task(String),
}
