use anyhow::{Context, Result};
use assetsync_config::SyncConfig;
use assetsync_watch::reconcile::{self, ReconcileAction};
use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::cli::OutputFormat;
use crate::context;

/// Execute reconcile command
pub async fn execute(config: SyncConfig, dry_run: bool, format: OutputFormat) -> Result<()> {
    let service = context::build_service(&config).await?;
    let plan = service
        .plan_reconciliation()
        .await
        .context("Failed to list catalog assets")?;

    print_plan(&plan, format)?;

    if dry_run || plan.is_empty() {
        return Ok(());
    }

    let summary = reconcile::apply(service.handler(), plan).await;
    println!(
        "{} {} applied, {} failed",
        "Reconciled:".green().bold(),
        summary.applied,
        summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("{} reconciliation actions failed, see log", summary.failed);
    }
    Ok(())
}

fn print_plan(plan: &[ReconcileAction], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let actions: Vec<serde_json::Value> = plan
                .iter()
                .map(|action| match action {
                    ReconcileAction::Create { record } => serde_json::json!({
                        "action": "create",
                        "file": record.relative_path,
                    }),
                    ReconcileAction::RenameRemote {
                        token,
                        display_name,
                        description,
                        record,
                    } => serde_json::json!({
                        "action": "rename",
                        "file": record.relative_path,
                        "token": token,
                        "display_name": display_name,
                        "description": description,
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&actions)?);
        }
        OutputFormat::Table => {
            if plan.is_empty() {
                println!("{}", "Catalog is up to date.".dimmed());
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Action", "File", "Token", "Display name"]);
            for action in plan {
                let row = match action {
                    ReconcileAction::Create { record } => vec![
                        Cell::new("create").fg(Color::Green),
                        Cell::new(record.relative_path.display()),
                        Cell::new(record.token_display()),
                        Cell::new(""),
                    ],
                    ReconcileAction::RenameRemote {
                        token,
                        display_name,
                        record,
                        ..
                    } => vec![
                        Cell::new("rename").fg(Color::Yellow),
                        Cell::new(record.relative_path.display()),
                        Cell::new(token),
                        Cell::new(display_name),
                    ],
                };
                table.add_row(row);
            }
            println!("{}", table);
        }
    }
    Ok(())
}
