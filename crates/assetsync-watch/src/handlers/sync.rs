//! Pipelines run for each lifecycle event.
//!
//! | event            | pipeline                                                    |
//! |------------------|-------------------------------------------------------------|
//! | `Created`        | transform, create record, embed token, assign, upload copy  |
//! | `Renamed`        | update the remote name and description                      |
//! | `ContentChanged` | transform, embed token in the copy, upload copy             |
//! | `Deleted`        | delete the remote record                                    |
//!
//! A failed pipeline is logged with the path, token and action involved. Its
//! guard marker is released either way, so touching the file retries it.

use assetsync_core::{
    CatalogClient, IdentityCodec, IdentityToken, ImageRecord, ImageTransform, RemoteAction,
    RemoteOperationError,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::events::SyncEvent;
use crate::guard::InFlight;

/// Runs pipelines against the external collaborators.
#[derive(Clone)]
pub struct SyncHandler {
    engine: SyncEngine,
    catalog: Arc<dyn CatalogClient>,
    transform: Arc<dyn ImageTransform>,
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}

impl SyncHandler {
    /// Create a handler.
    pub fn new(
        engine: SyncEngine,
        catalog: Arc<dyn CatalogClient>,
        transform: Arc<dyn ImageTransform>,
    ) -> Self {
        Self {
            engine,
            catalog,
            transform,
        }
    }

    /// The engine this handler reports back to.
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// The remote catalog.
    pub fn catalog(&self) -> &Arc<dyn CatalogClient> {
        &self.catalog
    }

    /// Dispatch events until `events` closes, then wait for running pipelines.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<SyncEvent>) {
        let mut tasks = JoinSet::new();

        while let Some(event) = events.recv().await {
            self.dispatch(event, &mut tasks);
            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    error!(error = %e, "pipeline task aborted");
                }
            }
        }

        debug!(pending = tasks.len(), "event channel closed, draining pipelines");
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "pipeline task aborted");
            }
        }
    }

    /// Consult the guard and spawn the pipeline for `event`.
    ///
    /// Returns `false` when the event was dropped.
    pub fn dispatch(&self, event: SyncEvent, tasks: &mut JoinSet<()>) -> bool {
        let guard = self.engine.guard();
        if !guard.admits(&event) {
            debug!(%event, "dropped by operation guard");
            return false;
        }

        let marker: Option<InFlight> = match &event {
            SyncEvent::Created(record) => match guard.begin_create(&record.path) {
                Some(marker) => Some(marker),
                None => return false,
            },
            SyncEvent::ContentChanged(record) => {
                let Some(token) = &record.identity_token else {
                    warn!(%event, "content change without identity token");
                    return false;
                };
                match guard.begin_update(token) {
                    Some(marker) => Some(marker),
                    None => return false,
                }
            }
            SyncEvent::Renamed(_) | SyncEvent::Deleted(_) => None,
        };

        info!(%event, "dispatching");
        let handler = self.clone();
        tasks.spawn(async move {
            let _marker = marker;
            let kind = event.kind();
            let record = event.record().clone();
            let result = match event {
                SyncEvent::Created(record) => handler.create(&record).await.map(|_| ()),
                SyncEvent::Renamed(record) => handler.rename(&record).await,
                SyncEvent::ContentChanged(record) => handler.update_content(&record).await,
                SyncEvent::Deleted(record) => handler.delete(&record).await.map(|_| ()),
            };
            if let Err(e) = result {
                error!(
                    action = %kind,
                    path = %record.path.display(),
                    token = record.token_display(),
                    error = %e,
                    "pipeline failed, touch the file to retry"
                );
            }
        });
        true
    }

    /// Create pipeline under the path marker. `None` if already in flight.
    pub async fn create_guarded(&self, record: &ImageRecord) -> Result<Option<IdentityToken>> {
        let Some(_marker) = self.engine.guard().begin_create(&record.path) else {
            debug!(path = %record.path.display(), "create already in flight");
            return Ok(None);
        };
        self.create(record).await.map(Some)
    }

    /// Publish a never-synced file and tag it and its generated copy.
    pub async fn create(&self, record: &ImageRecord) -> Result<IdentityToken> {
        let parsed = self.engine.naming().parse(&record.file_name);

        let output = self
            .transform
            .transform(&record.path, &record.file_name, &record.relative_path)
            .await?;

        let remote = self
            .catalog
            .create_record(&parsed.display_name, &parsed.description, &record.file_name)
            .await?;
        let token = remote.token().ok_or_else(|| {
            RemoteOperationError::new(
                RemoteAction::Create,
                record.file_name.as_str(),
                "catalog returned an empty identifier",
            )
        })?;

        let original = IdentityCodec::write(&output.original_bytes, &token)?;
        write_file(&record.path, &original).await?;
        let generated = IdentityCodec::write(&output.transformed_bytes, &token)?;
        write_file(&output.transformed_path, &generated).await?;

        self.engine.assign_identity(&record.path, token.clone());

        self.catalog
            .upload_asset(&token, &output.transformed_file_name, generated)
            .await?;

        info!(file = %record.relative_path.display(), token = %token, "created");
        Ok(token)
    }

    /// Push the current name of a synced file.
    pub async fn rename(&self, record: &ImageRecord) -> Result<()> {
        let Some(token) = &record.identity_token else {
            warn!(file = %record.relative_path.display(), "rename without identity token");
            return Ok(());
        };
        let parsed = self.engine.naming().parse(&record.file_name);
        self.rename_remote(token, &parsed.display_name, &parsed.description)
            .await?;
        info!(file = %record.relative_path.display(), token = %token, "renamed");
        Ok(())
    }

    /// Update the name and description of a remote record.
    pub async fn rename_remote(
        &self,
        token: &IdentityToken,
        display_name: &str,
        description: &str,
    ) -> Result<()> {
        self.catalog
            .update_name(token, display_name, description)
            .await?;
        Ok(())
    }

    /// Regenerate and re-upload the published copy of a synced file.
    pub async fn update_content(&self, record: &ImageRecord) -> Result<()> {
        let Some(token) = &record.identity_token else {
            warn!(file = %record.relative_path.display(), "content change without identity token");
            return Ok(());
        };

        let output = self
            .transform
            .transform(&record.path, &record.file_name, &record.relative_path)
            .await?;
        let generated = IdentityCodec::write(&output.transformed_bytes, token)?;
        write_file(&output.transformed_path, &generated).await?;

        self.catalog
            .upload_asset(token, &output.transformed_file_name, generated)
            .await?;

        info!(file = %record.relative_path.display(), token = %token, "content uploaded");
        Ok(())
    }

    /// Delete the remote record of a removed file.
    ///
    /// Returns `false` when the file never had a token.
    pub async fn delete(&self, record: &ImageRecord) -> Result<bool> {
        let Some(token) = &record.identity_token else {
            info!(file = %record.relative_path.display(), "deleted file was never synced");
            return Ok(false);
        };
        self.catalog.delete_record(token).await?;
        info!(file = %record.relative_path.display(), token = %token, "deleted");
        Ok(true)
    }
}

impl std::fmt::Debug for SyncHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandler")
            .field("engine", &self.engine)
            .finish()
    }
}
