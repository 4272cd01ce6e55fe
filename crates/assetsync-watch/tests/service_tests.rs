//! Startup reconciliation and the event loop.

mod common;

use assetsync_core::test_support::{CatalogCall, MockCatalogClient};
use assetsync_core::RemoteAction;
use assetsync_watch::{RawChange, ReconcileAction, SyncService};
use common::{jpeg, tagged_jpeg, token_in, Harness};
use std::fs;
use tokio::sync::{mpsc, oneshot};

#[tokio::test]
async fn test_reconcile_creates_renames_and_skips() {
    let catalog = MockCatalogClient::new()
        .with_record("asset-7", "Rose")
        .with_record("asset-8", "Old name");
    let harness = Harness::with_catalog(
        &[
            ("$Rose.jpg", tagged_jpeg(1, "asset-7")),
            ("$Tulip-Yellow.jpg", tagged_jpeg(2, "asset-8")),
            ("sub/$Fern.jpg", jpeg(3)),
            ("$Lily.jpg", tagged_jpeg(4, "gone")),
        ],
        catalog,
    )
    .await;
    let service = SyncService::new(harness.handler.clone());

    let plan = service.plan_reconciliation().await.unwrap();
    assert_eq!(plan.len(), 3);
    assert!(plan
        .iter()
        .any(|a| matches!(a, ReconcileAction::RenameRemote { display_name, .. } if display_name == "Tulip")));
    assert_eq!(
        plan.iter()
            .filter(|a| matches!(a, ReconcileAction::Create { .. }))
            .count(),
        2
    );

    let summary = service.reconcile().await.unwrap();
    assert_eq!(summary.applied, 3);
    assert_eq!(summary.failed, 0);

    assert_eq!(harness.catalog.display_name("asset-8").as_deref(), Some("Tulip"));
    assert!(token_in(&harness.path("sub/$Fern.jpg")).is_some());
    let lily = token_in(&harness.path("$Lily.jpg")).unwrap();
    assert_ne!(lily.as_str(), "gone");
    assert!(harness.generated("sub/$Fern-watermarked.jpg").exists());

    // A second pass finds nothing to do
    assert!(service.plan_reconciliation().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reconcile_continues_past_failures() {
    let harness = Harness::new(&[("$Fern.jpg", jpeg(1)), ("$Rose.jpg", jpeg(2))]).await;
    harness.catalog.fail_on(RemoteAction::Create);
    let service = SyncService::new(harness.handler.clone());

    let summary = service.reconcile().await.unwrap();
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.failed, 2);
    assert_eq!(harness.engine().guard().in_flight(), 0);
}

#[tokio::test]
async fn test_reconcile_fails_when_catalog_unreachable() {
    let harness = Harness::new(&[("$Rose.jpg", jpeg(1))]).await;
    harness.catalog.fail_on(RemoteAction::List);
    let service = SyncService::new(harness.handler.clone());

    assert!(service.reconcile().await.is_err());
}

#[tokio::test]
async fn test_run_until_processes_changes_then_drains() {
    let harness = Harness::new(&[]).await;
    let service = SyncService::new(harness.handler.clone());
    let path = harness.path("$Rose-Red.jpg");
    fs::write(&path, jpeg(1)).unwrap();

    let (change_tx, change_rx) = mpsc::unbounded_channel();
    change_tx.send(RawChange::modified(&path)).unwrap();
    drop(change_tx);

    let (_shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    service
        .run_until(change_rx, async {
            let _ = shutdown_rx.await;
        })
        .await;

    assert_eq!(harness.catalog.record_count(), 1);
    assert!(harness
        .catalog
        .calls()
        .iter()
        .any(|c| matches!(c, CatalogCall::Create { display_name, .. } if display_name == "Rose")));
    assert!(token_in(&path).is_some());
    assert_eq!(harness.engine().guard().in_flight(), 0);
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown() {
    let harness = Harness::new(&[]).await;
    let service = SyncService::new(harness.handler.clone());

    let (_change_tx, change_rx) = mpsc::unbounded_channel();
    service.run_until(change_rx, async {}).await;

    assert!(harness.catalog.calls().is_empty());
}
