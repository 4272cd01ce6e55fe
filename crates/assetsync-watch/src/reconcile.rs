//! Startup reconciliation of the mirror against the remote catalog.
//!
//! [`plan`] is pure: it only compares display names and identifiers.
//! [`apply`] executes the actions through the pipeline handler, one after the
//! other, logging and continuing past failures.

use assetsync_core::{IdentityToken, ImageRecord, NamingConvention, RecordRef};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info};

use crate::handlers::SyncHandler;

/// One catch-up operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Run the full create pipeline for a file that has no live remote record.
    Create {
        /// File to publish.
        record: ImageRecord,
    },
    /// Push the file's current name to its remote record.
    RenameRemote {
        /// Remote record.
        token: IdentityToken,
        /// New display name.
        display_name: String,
        /// New description.
        description: String,
        /// File the name comes from.
        record: ImageRecord,
    },
}

impl ReconcileAction {
    /// The file the action concerns.
    pub fn record(&self) -> &ImageRecord {
        match self {
            Self::Create { record } | Self::RenameRemote { record, .. } => record,
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { record } => write!(f, "create {}", record.relative_path.display()),
            Self::RenameRemote {
                token,
                display_name,
                record,
                ..
            } => write!(
                f,
                "rename {} -> '{}' ({})",
                token,
                display_name,
                record.relative_path.display()
            ),
        }
    }
}

/// Diff `records` against the catalog's `remote` records.
///
/// - token with a remote record of the same display name: nothing
/// - token with a remote record of another name: rename the remote record
/// - token unknown remotely, or no token: create
pub fn plan(
    records: &[ImageRecord],
    remote: &[RecordRef],
    naming: &NamingConvention,
) -> Vec<ReconcileAction> {
    let by_id: HashMap<&str, &RecordRef> = remote.iter().map(|r| (r.id.as_str(), r)).collect();

    records
        .iter()
        .filter_map(|record| {
            let Some(token) = &record.identity_token else {
                return Some(ReconcileAction::Create {
                    record: record.clone(),
                });
            };

            let Some(remote) = by_id.get(token.as_str()) else {
                debug!(token = %token, file = %record.relative_path.display(), "stale token, recreating");
                return Some(ReconcileAction::Create {
                    record: record.clone(),
                });
            };

            let parsed = naming.parse(&record.file_name);
            if parsed.display_name == remote.display_name {
                return None;
            }
            Some(ReconcileAction::RenameRemote {
                token: token.clone(),
                display_name: parsed.display_name,
                description: parsed.description,
                record: record.clone(),
            })
        })
        .collect()
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Actions that completed.
    pub applied: usize,
    /// Actions that failed and were logged.
    pub failed: usize,
}

/// Execute `actions` in order.
pub async fn apply(handler: &SyncHandler, actions: Vec<ReconcileAction>) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for action in actions {
        info!(%action, "reconciling");
        let result = match &action {
            ReconcileAction::Create { record } => handler.create_guarded(record).await.map(|_| ()),
            ReconcileAction::RenameRemote {
                token,
                display_name,
                description,
                ..
            } => handler.rename_remote(token, display_name, description).await,
        };

        match result {
            Ok(()) => summary.applied += 1,
            Err(e) => {
                let record = action.record();
                error!(
                    %action,
                    path = %record.path.display(),
                    token = record.token_display(),
                    error = %e,
                    "reconcile action failed"
                );
                summary.failed += 1;
            }
        }
    }

    info!(applied = summary.applied, failed = summary.failed, "reconciliation finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

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
    fn test_plan_covers_every_case() {
        let naming = NamingConvention::default();
        let records = vec![
            record("$Fern-Green leaves.jpg", Some("f1")),
            record("$Rose-Red.jpg", Some("r1")),
            record("$Tulip.jpg", Some("gone")),
            record("$Lily.jpg", None),
        ];
        let remote = vec![RecordRef::new("f1", "Fern"), RecordRef::new("r1", "Old rose")];

        let actions = plan(&records, &remote, &naming);

        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            ReconcileAction::RenameRemote {
                token: IdentityToken::new("r1").unwrap(),
                display_name: "Rose".to_string(),
                description: "Red".to_string(),
                record: records[1].clone(),
            }
        );
        assert!(matches!(&actions[1], ReconcileAction::Create { record } if record.file_name == "$Tulip.jpg"));
        assert!(matches!(&actions[2], ReconcileAction::Create { record } if record.file_name == "$Lily.jpg"));
    }

    #[test]
    fn test_plan_is_idempotent_once_caught_up() {
        let naming = NamingConvention::default();
        let records = vec![
            record("$Fern-Green leaves.jpg", Some("f1")),
            record("$Rose.jpg", Some("r1")),
        ];
        let remote = vec![RecordRef::new("f1", "Fern"), RecordRef::new("r1", "Rose")];

        assert!(plan(&records, &remote, &naming).is_empty());
        assert!(plan(&records, &remote, &naming).is_empty());
    }

    #[test]
    fn test_empty_mirror_plans_nothing() {
        let remote = vec![RecordRef::new("orphan", "Orphan")];
        assert!(plan(&[], &remote, &NamingConvention::default()).is_empty());
    }
}
