use anyhow::Result;
use clap::Parser;
use tracing::debug;

use assetsync_cli::{
    cli::{Cli, Commands},
    commands, context, logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config subcommands manage the file itself and must work without a valid one
    if let Some(Commands::Config(cmd)) = &cli.command {
        let level = cli.requested_level().map(|l| l.as_str()).unwrap_or("warn");
        let _guard = logging::init(level, None);
        return commands::config::execute(&cli, cmd).await;
    }

    let config = context::load_config(&cli)?;
    let _guard = logging::init(&config.logging.level, config.logging.directory.as_deref());
    debug!(root = %config.asset_directory.display(), "configuration loaded");

    match cli.command {
        Some(Commands::Scan { format }) => commands::scan::execute(config, format).await,
        Some(Commands::Reconcile { dry_run, format }) => {
            commands::reconcile::execute(config, dry_run, format).await
        }
        Some(Commands::Run) | None => commands::run::execute(config).await,
        Some(Commands::Config(_)) => Ok(()),
    }
}
