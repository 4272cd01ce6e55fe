//! Operation guard: in-flight markers that suppress self-triggered events.
//!
//! Writing an identity token back into a file raises a filesystem
//! notification of its own. While a create pipeline runs for a path, or an
//! update pipeline for a token, events that pipeline would trigger are
//! dropped instead of dispatched.
//!
//! Markers are RAII values: dropping an [`InFlight`] clears it, whether the
//! pipeline succeeded, failed or panicked.

use assetsync_core::IdentityToken;
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::events::SyncEvent;

/// Two independent sets of in-flight markers.
#[derive(Debug, Clone, Default)]
pub struct OperationGuard {
    creating: Arc<DashSet<PathBuf>>,
    updating: Arc<DashSet<IdentityToken>>,
}

#[derive(Debug)]
enum MarkerKey {
    Creating(PathBuf),
    Updating(IdentityToken),
}

/// A held marker. Cleared on drop.
#[derive(Debug)]
#[must_use = "the marker is cleared as soon as it is dropped"]
pub struct InFlight {
    key: MarkerKey,
    guard: OperationGuard,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        match &self.key {
            MarkerKey::Creating(path) => {
                self.guard.creating.remove(path);
            }
            MarkerKey::Updating(token) => {
                self.guard.updating.remove(token);
            }
        }
    }
}

impl OperationGuard {
    /// A guard with no markers set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as being created. `None` if it already is.
    pub fn begin_create(&self, path: &Path) -> Option<InFlight> {
        self.creating.insert(path.to_path_buf()).then(|| InFlight {
            key: MarkerKey::Creating(path.to_path_buf()),
            guard: self.clone(),
        })
    }

    /// Mark `token` as being updated. `None` if it already is.
    pub fn begin_update(&self, token: &IdentityToken) -> Option<InFlight> {
        self.updating.insert(token.clone()).then(|| InFlight {
            key: MarkerKey::Updating(token.clone()),
            guard: self.clone(),
        })
    }

    /// Whether a create pipeline is running for `path`.
    pub fn is_creating(&self, path: &Path) -> bool {
        self.creating.contains(path)
    }

    /// Whether an update pipeline is running for `token`.
    pub fn is_updating(&self, token: &IdentityToken) -> bool {
        self.updating.contains(token)
    }

    /// Whether `event` may be dispatched.
    ///
    /// `ContentChanged` is dropped while its path is being created or its
    /// token updated. `Created` and `Renamed` are dropped while their path is
    /// being created. `Deleted` always passes.
    pub fn admits(&self, event: &SyncEvent) -> bool {
        let path = &event.record().path;
        match event {
            SyncEvent::ContentChanged(record) => {
                !self.is_creating(path)
                    && !record
                        .identity_token
                        .as_ref()
                        .is_some_and(|t| self.is_updating(t))
            }
            SyncEvent::Created(_) | SyncEvent::Renamed(_) => !self.is_creating(path),
            SyncEvent::Deleted(_) => true,
        }
    }

    /// Number of markers currently held.
    pub fn in_flight(&self) -> usize {
        self.creating.len() + self.updating.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetsync_core::ImageRecord;

    fn record(name: &str, token: Option<&str>) -> ImageRecord {
        let root = Path::new("/srv/assets");
        ImageRecord::new(
            root,
            root.join(name),
            token.and_then(IdentityToken::new),
            "fp".to_string(),
        )
    }

    #[test]
    fn test_marker_cleared_on_drop() {
        let guard = OperationGuard::new();
        let path = Path::new("/srv/assets/$Rose.jpg");

        let marker = guard.begin_create(path).unwrap();
        assert!(guard.is_creating(path));
        assert!(guard.begin_create(path).is_none());

        drop(marker);
        assert!(!guard.is_creating(path));
        assert_eq!(guard.in_flight(), 0);
    }

    #[test]
    fn test_content_changed_dropped_while_creating() {
        let guard = OperationGuard::new();
        let event = SyncEvent::ContentChanged(record("$Rose.jpg", Some("r1")));

        let _marker = guard.begin_create(&event.record().path).unwrap();
        assert!(!guard.admits(&event));
        assert!(!guard.admits(&SyncEvent::Created(record("$Rose.jpg", None))));
        assert!(!guard.admits(&SyncEvent::Renamed(record("$Rose.jpg", Some("r1")))));
        assert!(guard.admits(&SyncEvent::Deleted(record("$Rose.jpg", Some("r1")))));
    }

    #[test]
    fn test_content_changed_dropped_while_updating() {
        let guard = OperationGuard::new();
        let token = IdentityToken::new("r1").unwrap();
        let marker = guard.begin_update(&token).unwrap();

        let event = SyncEvent::ContentChanged(record("$Rose.jpg", Some("r1")));
        assert!(!guard.admits(&event));
        assert!(guard.admits(&SyncEvent::ContentChanged(record("$Other.jpg", Some("o1")))));
        assert!(guard.admits(&SyncEvent::Renamed(record("$Rose.jpg", Some("r1")))));

        drop(marker);
        assert!(guard.admits(&event));
    }

    #[tokio::test]
    async fn test_marker_cleared_when_pipeline_panics() {
        let guard = OperationGuard::new();
        let token = IdentityToken::new("r1").unwrap();
        let marker = guard.begin_update(&token).unwrap();

        let result = tokio::spawn(async move {
            let _marker = marker;
            panic!("pipeline failed");
        })
        .await;

        assert!(result.is_err());
        assert!(!guard.is_updating(&token));
    }
}
