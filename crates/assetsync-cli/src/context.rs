//! Building the engine and its collaborators from configuration.

use anyhow::{Context, Result};
use assetsync_catalog::ContentfulClient;
use assetsync_config::{ConfigLoader, ConfigOverrides, LoadOptions, SyncConfig};
use assetsync_watch::{EngineOptions, ReservedRootDir, SyncEngine, SyncHandler, SyncService};
use assetsync_watermark::Watermarker;
use std::sync::Arc;

use crate::cli::Cli;

/// Load the effective configuration for `cli`.
pub fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let options = LoadOptions {
        config_file: cli.config.clone(),
        profile: cli.profile.clone(),
        overrides: ConfigOverrides {
            asset_directory: cli.asset_dir.clone(),
            log_level: cli.requested_level().map(|l| l.as_str().to_string()),
            log_directory: cli.log_dir.clone(),
        },
    };
    ConfigLoader::load(&options).context("Failed to load configuration")
}

/// Engine options for the naming and output directory of `config`.
pub fn engine_options(config: &SyncConfig) -> EngineOptions {
    EngineOptions {
        naming: config.naming_convention(),
        exclusion: Arc::new(ReservedRootDir::new(config.watermark.output_dir.clone())),
    }
}

/// Scan the asset directory.
pub async fn build_engine(config: &SyncConfig) -> Result<SyncEngine> {
    config.validate().context("Invalid configuration")?;
    SyncEngine::initialize(config.asset_directory.clone(), engine_options(config))
        .await
        .with_context(|| format!("Failed to scan {}", config.asset_directory.display()))
}

/// Engine plus the Contentful client and the watermarker.
pub async fn build_service(config: &SyncConfig) -> Result<SyncService> {
    config.validate().context("Invalid configuration")?;
    let catalog = ContentfulClient::new(&config.catalog).context("Failed to create catalog client")?;
    let watermarker = Watermarker::new(
        config.asset_directory.clone(),
        &config.watermark,
        config.naming_convention(),
    )
    .context("Failed to load watermark overlay")?;

    let engine = build_engine(config).await?;
    let handler = SyncHandler::new(engine, Arc::new(catalog), Arc::new(watermarker));
    Ok(SyncService::new(handler))
}
