//! Notify-based file watching backend.
//!
//! Debounced notify events are flattened into [`RawChange`]s. Within one
//! debounced batch every modification is delivered before any removal, so a
//! move is seen as `Modified(to)` followed by `Removed(from)` and the
//! classifier relocates the record instead of deleting it.

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::events::{ChangeKind, RawChange};

/// Recursive watch over the root. Watching stops when this is dropped.
pub struct NotifyBackend {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    root: PathBuf,
}

impl NotifyBackend {
    /// Start watching `root`, sending changes to `sender`.
    pub fn start(
        root: &Path,
        debounce: Duration,
        sender: mpsc::UnboundedSender<RawChange>,
    ) -> Result<Self> {
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for change in convert_events(&events) {
                        trace!(?change, "raw change");
                        if sender.send(change).is_err() {
                            debug!("change receiver closed");
                            return;
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Notify error: {:?}", error);
                    }
                }
            }
        })
        .map_err(|e| Error::Watch(format!("Failed to create notify watcher: {}", e)))?;

        debouncer
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("Failed to watch {}: {}", root.display(), e)))?;

        info!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "watching");
        Ok(Self {
            _debouncer: debouncer,
            root: root.to_path_buf(),
        })
    }

    /// The watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("root", &self.root)
            .finish()
    }
}

/// Flatten a debounced batch, modifications first, duplicates removed.
pub fn convert_events(events: &[DebouncedEvent]) -> Vec<RawChange> {
    let mut modified = Vec::new();
    let mut removed = Vec::new();

    for event in events {
        let paths = &event.event.paths;
        match event.event.kind {
            EventKind::Create(_) => modified.extend(paths.iter().cloned()),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to, ..] = paths.as_slice() {
                    modified.push(to.clone());
                    removed.push(from.clone());
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                removed.extend(paths.iter().cloned())
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                modified.extend(paths.iter().cloned())
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in paths {
                    if path.exists() {
                        modified.push(path.clone());
                    } else {
                        removed.push(path.clone());
                    }
                }
            }
            EventKind::Modify(_) => modified.extend(paths.iter().cloned()),
            EventKind::Remove(_) => removed.extend(paths.iter().cloned()),
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    modified
        .into_iter()
        .map(|p| (ChangeKind::Modified, p))
        .chain(removed.into_iter().map(|p| (ChangeKind::Removed, p)))
        .filter(|entry| seen.insert(entry.clone()))
        .map(|(kind, path)| RawChange { kind, path })
        .collect()
}
