//! Raw filesystem notifications and the semantic events derived from them.

use assetsync_core::{IdentityToken, ImageRecord};
use std::fmt;
use std::path::PathBuf;

/// Kind of a raw filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The file was created, written or moved into place.
    Modified,
    /// The file was deleted or moved away.
    Removed,
}

/// A notification as delivered by the watch backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawChange {
    /// What happened.
    pub kind: ChangeKind,
    /// Absolute path of the file.
    pub path: PathBuf,
}

impl RawChange {
    /// A modification notification.
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Modified,
            path: path.into(),
        }
    }

    /// A removal notification.
    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            path: path.into(),
        }
    }
}

/// Lifecycle event emitted by the classifier.
///
/// Each variant carries the current record; `Deleted` carries the record as
/// it was last known before removal from the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A never-synced qualifying file appeared.
    Created(ImageRecord),
    /// A synced file moved or had only its metadata touched.
    Renamed(ImageRecord),
    /// The pixels of a synced file changed.
    ContentChanged(ImageRecord),
    /// A tracked file disappeared.
    Deleted(ImageRecord),
}

/// Discriminant of [`SyncEvent`], for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEventKind {
    /// [`SyncEvent::Created`]
    Created,
    /// [`SyncEvent::Renamed`]
    Renamed,
    /// [`SyncEvent::ContentChanged`]
    ContentChanged,
    /// [`SyncEvent::Deleted`]
    Deleted,
}

impl SyncEvent {
    /// The record carried by the event.
    pub fn record(&self) -> &ImageRecord {
        match self {
            Self::Created(r) | Self::Renamed(r) | Self::ContentChanged(r) | Self::Deleted(r) => r,
        }
    }

    /// Take the record out of the event.
    pub fn into_record(self) -> ImageRecord {
        match self {
            Self::Created(r) | Self::Renamed(r) | Self::ContentChanged(r) | Self::Deleted(r) => r,
        }
    }

    /// The event kind.
    pub fn kind(&self) -> SyncEventKind {
        match self {
            Self::Created(_) => SyncEventKind::Created,
            Self::Renamed(_) => SyncEventKind::Renamed,
            Self::ContentChanged(_) => SyncEventKind::ContentChanged,
            Self::Deleted(_) => SyncEventKind::Deleted,
        }
    }

    /// Identity token of the carried record.
    pub fn token(&self) -> Option<&IdentityToken> {
        self.record().identity_token.as_ref()
    }
}

impl fmt::Display for SyncEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Renamed => "renamed",
            Self::ContentChanged => "content-changed",
            Self::Deleted => "deleted",
        })
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record();
        write!(
            f,
            "{} {} (token {})",
            self.kind(),
            record.relative_path.display(),
            record.token_display()
        )
    }
}
