//! Wiring of scan, reconciliation and the live watch loop.
//!
//! ```text
//! NotifyBackend --RawChange--> classifier loop --SyncEvent--> orchestration loop
//!                               (SyncEngine)                    (SyncHandler)
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::backends::NotifyBackend;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::events::RawChange;
use crate::handlers::SyncHandler;
use crate::reconcile::{self, ReconcileAction, ReconcileSummary};

/// The running sync service.
#[derive(Debug, Clone)]
pub struct SyncService {
    handler: SyncHandler,
}

impl SyncService {
    /// Create a service around a handler.
    pub fn new(handler: SyncHandler) -> Self {
        Self { handler }
    }

    /// The engine.
    pub fn engine(&self) -> &SyncEngine {
        self.handler.engine()
    }

    /// The pipeline handler.
    pub fn handler(&self) -> &SyncHandler {
        &self.handler
    }

    /// Fetch the catalog's records and plan the startup reconciliation.
    pub async fn plan_reconciliation(&self) -> Result<Vec<ReconcileAction>> {
        let remote = self.handler.catalog().list_records().await?;
        debug!(remote = remote.len(), "catalog records listed");
        Ok(self.engine().plan_reconciliation(&remote))
    }

    /// Plan and apply the startup reconciliation.
    pub async fn reconcile(&self) -> Result<ReconcileSummary> {
        let actions = self.plan_reconciliation().await?;
        Ok(reconcile::apply(&self.handler, actions).await)
    }

    /// Watch the root until `shutdown` resolves.
    pub async fn watch_until<F>(self, debounce: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let backend = NotifyBackend::start(self.engine().root(), debounce, change_tx)?;
        self.run_until(change_rx, shutdown).await;
        drop(backend);
        Ok(())
    }

    /// Classify and dispatch `changes` until `shutdown` resolves or the
    /// channel closes, then wait for running pipelines.
    pub async fn run_until<F>(self, changes: mpsc::UnboundedReceiver<RawChange>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let engine = self.engine().clone();
        let mut classifier =
            tokio::spawn(async move { engine.run_classifier(changes, event_tx).await });
        let orchestrator = tokio::spawn(self.handler.run(event_rx));

        tokio::select! {
            _ = shutdown => {
                info!("shutdown requested");
                classifier.abort();
            }
            _ = &mut classifier => {
                debug!("change stream ended");
            }
        }

        if let Err(e) = orchestrator.await {
            tracing::error!(error = %e, "orchestration loop aborted");
        }
        info!("sync service stopped");
    }
}
