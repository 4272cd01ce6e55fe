//! The sync engine facade.
//!
//! Owns the mirror, the classifier and the operation guard. The mirror is
//! only mutated through [`SyncEngine::classify`] and
//! [`SyncEngine::assign_identity`]; everything else is a read-only lookup.

use assetsync_core::{IdentityToken, ImageRecord, NamingConvention, RecordRef};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::classifier::EventClassifier;
use crate::error::{Error, Result};
use crate::events::{RawChange, SyncEvent};
use crate::file_scanner::{InventoryScanner, SkippedFile};
use crate::filter::{PathExclusion, ReservedRootDir};
use crate::guard::OperationGuard;
use crate::mirror::Mirror;
use crate::reconcile::{self, ReconcileAction};

/// How the engine recognises sync subjects.
#[derive(Clone)]
pub struct EngineOptions {
    /// File naming rules.
    pub naming: NamingConvention,
    /// Paths left out of scan and classification.
    pub exclusion: Arc<dyn PathExclusion>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            naming: NamingConvention::default(),
            exclusion: Arc::new(ReservedRootDir::default()),
        }
    }
}

struct EngineInner {
    root: PathBuf,
    naming: NamingConvention,
    mirror: Mutex<Mirror>,
    classifier: EventClassifier,
    guard: OperationGuard,
    skipped: Vec<SkippedFile>,
}

/// File state reconciliation engine. Cheap to clone.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Scan `root` and build the mirror.
    ///
    /// Fails when `root` is not a directory or any directory below it cannot
    /// be listed.
    pub async fn initialize(root: impl Into<PathBuf>, options: EngineOptions) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let scanner = InventoryScanner::new(options.naming.clone(), options.exclusion.clone());
        let report = scanner.scan(&root).await?;
        let mirror = Mirror::from_records(report.records);
        info!(root = %root.display(), records = mirror.len(), "sync engine initialized");

        let classifier = EventClassifier::new(root.clone(), options.naming.clone(), options.exclusion);
        Ok(Self {
            inner: Arc::new(EngineInner {
                root,
                naming: options.naming,
                mirror: Mutex::new(mirror),
                classifier,
                guard: OperationGuard::new(),
                skipped: report.skipped,
            }),
        })
    }

    /// The watched root.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// The naming convention in use.
    pub fn naming(&self) -> &NamingConvention {
        &self.inner.naming
    }

    /// The operation guard shared with the orchestration layer.
    pub fn guard(&self) -> &OperationGuard {
        &self.inner.guard
    }

    /// Files the initial scan could not read.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.inner.skipped
    }

    /// Snapshot of all records, ordered by relative path.
    pub fn records(&self) -> Vec<ImageRecord> {
        self.inner.mirror.lock().records()
    }

    /// Record at `path`.
    pub fn record_for_path(&self, path: &Path) -> Option<ImageRecord> {
        self.inner.mirror.lock().find_by_path(path).cloned()
    }

    /// Record carrying `token`.
    pub fn record_for_token(&self, token: &IdentityToken) -> Option<ImageRecord> {
        self.inner.mirror.lock().find_by_token(token).cloned()
    }

    /// Classify one raw notification, updating the mirror.
    pub async fn classify(&self, change: &RawChange) -> Result<Option<SyncEvent>> {
        self.inner
            .classifier
            .classify(&self.inner.mirror, change)
            .await
    }

    /// Startup actions bringing the catalog in line with the mirror.
    pub fn plan_reconciliation(&self, remote: &[RecordRef]) -> Vec<ReconcileAction> {
        reconcile::plan(&self.records(), remote, &self.inner.naming)
    }

    /// Record that the file at `path` now carries `token`.
    ///
    /// Returns `false` when no record lives at `path` any more.
    pub fn assign_identity(&self, path: &Path, token: IdentityToken) -> bool {
        let assigned = self.inner.mirror.lock().assign_token(path, token.clone());
        match assigned {
            Some(record) => {
                debug!(file = %record.relative_path.display(), token = %token, "identity assigned");
                true
            }
            None => {
                warn!(path = %path.display(), token = %token, "cannot assign identity, record not in mirror");
                false
            }
        }
    }

    /// Classify notifications until `changes` closes or `events` is dropped.
    ///
    /// Per-file failures are logged and skipped.
    pub async fn run_classifier(
        &self,
        mut changes: mpsc::UnboundedReceiver<RawChange>,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) {
        while let Some(change) = changes.recv().await {
            match self.classify(&change).await {
                Ok(Some(event)) => {
                    if events.send(event).is_err() {
                        debug!("event receiver closed, stopping classifier");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %change.path.display(), error = %e, "skipping notification");
                }
            }
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("root", &self.inner.root)
            .field("records", &self.inner.mirror.lock().len())
            .field("in_flight", &self.inner.guard.in_flight())
            .finish()
    }
}
