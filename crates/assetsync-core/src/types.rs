//! Mirror record and catalog reference types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of a remote catalog record, as embedded in an image file.
///
/// An image that has never been associated with a record carries no token;
/// that state is modelled as `Option<IdentityToken>::None` rather than an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Wrap a record identifier. Returns `None` for an empty or blank id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of the in-memory mirror of the on-disk inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Absolute path of the file.
    pub path: PathBuf,

    /// Path relative to the watched root.
    pub relative_path: PathBuf,

    /// Final path component.
    pub file_name: String,

    /// Catalog identifier read from the file's metadata, if any.
    pub identity_token: Option<IdentityToken>,

    /// Hash of the image-bearing bytes, see [`crate::IdentityCodec::fingerprint`].
    pub content_fingerprint: String,
}

impl ImageRecord {
    /// Build a record for `path` under `root`.
    ///
    /// Paths outside `root` keep their full path as the relative path.
    pub fn new(
        root: &Path,
        path: PathBuf,
        identity_token: Option<IdentityToken>,
        content_fingerprint: String,
    ) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            relative_path,
            file_name,
            identity_token,
            content_fingerprint,
        }
    }

    /// Whether the record has been associated with a catalog record.
    pub fn is_synced(&self) -> bool {
        self.identity_token.is_some()
    }

    /// Token as a display string, `-` when unassigned.
    pub fn token_display(&self) -> &str {
        self.identity_token
            .as_ref()
            .map(IdentityToken::as_str)
            .unwrap_or("-")
    }
}

/// A record as known by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// Remote identifier, equal to the identity token of the linked file.
    pub id: String,

    /// Current display name of the record.
    pub display_name: String,
}

impl RecordRef {
    /// Create a new record reference.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// The identifier as a token. `None` if the remote returned a blank id.
    pub fn token(&self) -> Option<IdentityToken> {
        IdentityToken::new(self.id.clone())
    }
}
