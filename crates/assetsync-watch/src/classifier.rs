//! Event classifier: raw notifications to lifecycle events.
//!
//! Rules, applied in order to a notification for a sync subject:
//!
//! 1. Path gone: remove the record at that path and emit `Deleted`, or
//!    nothing when no record lives there. A removal for a file that still
//!    exists yields nothing.
//! 2. Re-read the file for its identity token and fingerprint.
//! 3. No token and a modification: first sight of the file, upsert the record
//!    and emit `Created`.
//! 4. Look the token up in the mirror. A record elsewhere whose file still
//!    exists makes this a stale notification. Otherwise the record moves to
//!    the current path and the event is `Renamed` for an unchanged
//!    fingerprint and `ContentChanged` for a changed one. An unknown token
//!    yields nothing.

use assetsync_core::NamingConvention;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::events::{ChangeKind, RawChange, SyncEvent};
use crate::file_scanner::record_from_bytes;
use crate::filter::PathExclusion;
use crate::mirror::Mirror;

/// Classifies notifications against the mirror, mutating it as it goes.
#[derive(Clone)]
pub struct EventClassifier {
    root: PathBuf,
    naming: NamingConvention,
    exclusion: Arc<dyn PathExclusion>,
}

impl EventClassifier {
    /// Create a classifier for the tree at `root`.
    pub fn new(
        root: impl Into<PathBuf>,
        naming: NamingConvention,
        exclusion: Arc<dyn PathExclusion>,
    ) -> Self {
        Self {
            root: root.into(),
            naming,
            exclusion,
        }
    }

    /// Whether notifications for `path` are considered at all.
    pub fn is_candidate(&self, path: &Path) -> bool {
        let is_subject = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.naming.is_sync_subject(n));
        is_subject && !self.exclusion.is_excluded(&self.root, path)
    }

    /// Classify one notification.
    ///
    /// A file that cannot be read yields [`Error::FileRead`]; the caller logs
    /// it and moves on to the next notification.
    pub async fn classify(
        &self,
        mirror: &Mutex<Mirror>,
        change: &RawChange,
    ) -> Result<Option<SyncEvent>> {
        let path = &change.path;
        if !self.is_candidate(path) {
            trace!(path = %path.display(), "ignoring non-subject");
            return Ok(None);
        }

        if !path.exists() {
            return Ok(self.classify_missing(mirror, path));
        }
        if change.kind == ChangeKind::Removed {
            // Unlink-then-recreate saves; the recreate arrives as its own modification
            trace!(path = %path.display(), "removal notification for a file that exists");
            return Ok(None);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(self.classify_missing(mirror, path));
            }
            Err(source) => {
                return Err(Error::FileRead {
                    path: path.clone(),
                    source,
                })
            }
        };
        let current = record_from_bytes(&self.root, path.clone(), &bytes);

        let mut mirror = mirror.lock();

        let Some(token) = current.identity_token.clone() else {
            debug!(file = %current.relative_path.display(), "new file");
            mirror.insert(current.clone());
            return Ok(Some(SyncEvent::Created(current)));
        };

        let Some(known) = mirror.find_by_token(&token).cloned() else {
            warn!(
                path = %path.display(),
                token = %token,
                "identity token not in mirror, no event emitted"
            );
            return Ok(None);
        };

        if known.path != current.path && known.path.exists() {
            debug!(
                path = %path.display(),
                owner = %known.path.display(),
                token = %token,
                "stale notification, token owned by an existing file"
            );
            return Ok(None);
        }

        let content_changed = known.content_fingerprint != current.content_fingerprint;
        mirror.relocate(&known.path, current.clone());

        if content_changed {
            debug!(file = %current.relative_path.display(), token = %token, "content changed");
            Ok(Some(SyncEvent::ContentChanged(current)))
        } else {
            debug!(file = %current.relative_path.display(), token = %token, "renamed");
            Ok(Some(SyncEvent::Renamed(current)))
        }
    }

    fn classify_missing(&self, mirror: &Mutex<Mirror>, path: &Path) -> Option<SyncEvent> {
        let removed = mirror.lock().remove(path);
        match removed {
            Some(record) => {
                debug!(file = %record.relative_path.display(), token = record.token_display(), "deleted");
                Some(SyncEvent::Deleted(record))
            }
            None => {
                trace!(path = %path.display(), "removal of untracked path");
                None
            }
        }
    }
}

impl std::fmt::Debug for EventClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventClassifier")
            .field("root", &self.root)
            .field("naming", &self.naming)
            .field("exclusion", &self.exclusion.name())
            .finish()
    }
}
