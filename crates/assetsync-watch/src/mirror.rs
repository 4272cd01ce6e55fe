//! In-memory mirror of the on-disk inventory.
//!
//! Records are keyed by absolute path with a secondary index by identity
//! token. At most one record per token resolves to an existing file: when two
//! would, the one whose path no longer exists is evicted.

use assetsync_core::{IdentityToken, ImageRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The engine's view of the watched tree.
#[derive(Debug, Default)]
pub struct Mirror {
    by_path: HashMap<PathBuf, ImageRecord>,
    by_token: HashMap<IdentityToken, PathBuf>,
}

impl Mirror {
    /// An empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from scanned records, resolving token collisions.
    pub fn from_records(records: impl IntoIterator<Item = ImageRecord>) -> Self {
        let mut mirror = Self::new();
        for record in records {
            mirror.insert(record);
        }
        mirror
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether the mirror holds no records.
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Record at `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<&ImageRecord> {
        self.by_path.get(path)
    }

    /// Record carrying `token`.
    pub fn find_by_token(&self, token: &IdentityToken) -> Option<&ImageRecord> {
        self.by_token.get(token).and_then(|p| self.by_path.get(p))
    }

    /// All records, ordered by relative path.
    pub fn records(&self) -> Vec<ImageRecord> {
        let mut records: Vec<_> = self.by_path.values().cloned().collect();
        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        records
    }

    /// Insert or replace the record at its path.
    ///
    /// Returns `false` when the record's token already belongs to another
    /// record whose file still exists; the mirror is left unchanged then.
    pub fn insert(&mut self, record: ImageRecord) -> bool {
        if let Some(token) = &record.identity_token {
            if let Some(other) = self.by_token.get(token).cloned() {
                if other != record.path {
                    if other.exists() {
                        warn!(
                            token = %token,
                            kept = %other.display(),
                            ignored = %record.path.display(),
                            "identity token already claimed by another file"
                        );
                        return false;
                    }
                    debug!(token = %token, stale = %other.display(), "evicting stale record");
                    self.remove(&other);
                }
            }
        }

        self.remove(&record.path);
        if let Some(token) = &record.identity_token {
            self.by_token.insert(token.clone(), record.path.clone());
        }
        self.by_path.insert(record.path.clone(), record);
        true
    }

    /// Remove the record at `path`.
    pub fn remove(&mut self, path: &Path) -> Option<ImageRecord> {
        let record = self.by_path.remove(path)?;
        if let Some(token) = &record.identity_token {
            if self.by_token.get(token).is_some_and(|p| p == path) {
                self.by_token.remove(token);
            }
        }
        Some(record)
    }

    /// Move the record at `old_path` to the location and contents of `record`.
    pub fn relocate(&mut self, old_path: &Path, record: ImageRecord) {
        self.remove(old_path);
        self.insert(record);
    }

    /// Set the identity token of the record at `path`.
    ///
    /// Returns the updated record, or `None` when no record lives at `path`
    /// or the token is claimed by another existing file.
    pub fn assign_token(&mut self, path: &Path, token: IdentityToken) -> Option<ImageRecord> {
        let mut record = self.by_path.get(path)?.clone();
        record.identity_token = Some(token);
        if self.insert(record.clone()) {
            Some(record)
        } else {
            None
        }
    }
}
