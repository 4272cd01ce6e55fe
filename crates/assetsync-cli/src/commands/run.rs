use anyhow::{Context, Result};
use assetsync_config::SyncConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::context;

/// Execute run command: reconcile, then watch until Ctrl-C
pub async fn execute(config: SyncConfig) -> Result<()> {
    let service = context::build_service(&config).await?;
    info!(
        root = %config.asset_directory.display(),
        files = service.engine().records().len(),
        "starting sync service"
    );

    match service.reconcile().await {
        Ok(summary) => info!(
            applied = summary.applied,
            failed = summary.failed,
            "startup reconciliation finished"
        ),
        Err(e) => warn!(error = %e, "startup reconciliation skipped, catalog unreachable"),
    }

    let debounce = Duration::from_millis(config.watch.debounce_ms);
    service
        .watch_until(debounce, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("Watcher failed")?;

    Ok(())
}
