use anyhow::{Context, Result};
use assetsync_config::ConfigLoader;
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::{Cli, ConfigCommands, ConfigFormat};
use crate::context;

/// Execute config subcommand
pub async fn execute(cli: &Cli, cmd: &ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path.clone(), *force),
        ConfigCommands::Show { format } => show(cli, *format),
    }
}

/// Initialize a new config file
fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => ConfigLoader::default_config_path()
            .context("Could not determine config file path")?,
    };

    if config_path.exists() && !force {
        println!(
            "{} Config file already exists at: {}",
            "Error:".red().bold(),
            config_path.display()
        );
        println!("Use {} to overwrite", "--force".yellow());
        return Ok(());
    }

    ConfigLoader::create_example(&config_path)?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        config_path.display()
    );
    println!(
        "\n{}",
        "Set asset_directory and the [catalog] credentials before running.".dimmed()
    );
    Ok(())
}

/// Show the current effective configuration
fn show(cli: &Cli, format: ConfigFormat) -> Result<()> {
    let config = context::load_config(cli)?;
    let rendered = match format {
        ConfigFormat::Json => config.display_as_json()?,
        ConfigFormat::Toml => config.display_as_toml()?,
    };
    println!("{}", rendered);
    Ok(())
}
