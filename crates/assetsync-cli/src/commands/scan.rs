use anyhow::Result;
use assetsync_config::SyncConfig;
use comfy_table::{Cell, Color, Table};

use crate::cli::OutputFormat;
use crate::context;

/// Execute scan command
pub async fn execute(config: SyncConfig, format: OutputFormat) -> Result<()> {
    let engine = context::build_engine(&config).await?;
    let records = engine.records();

    match format {
        OutputFormat::Json => {
            let skipped: Vec<serde_json::Value> = engine
                .skipped()
                .iter()
                .map(|s| serde_json::json!({ "path": s.path, "reason": s.reason }))
                .collect();
            let report = serde_json::json!({
                "root": engine.root(),
                "records": records,
                "skipped": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["File", "Identity token", "Fingerprint"]);

            for record in &records {
                let token_cell = if record.is_synced() {
                    Cell::new(record.token_display()).fg(Color::Green)
                } else {
                    Cell::new(record.token_display()).fg(Color::Yellow)
                };
                table.add_row(vec![
                    Cell::new(record.relative_path.display()),
                    token_cell,
                    Cell::new(short_fingerprint(&record.content_fingerprint)),
                ]);
            }
            for skipped in engine.skipped() {
                table.add_row(vec![
                    Cell::new(skipped.path.display()),
                    Cell::new("skipped").fg(Color::Red),
                    Cell::new(&skipped.reason),
                ]);
            }

            println!("{}", table);
            let synced = records.iter().filter(|r| r.is_synced()).count();
            println!(
                "{} files, {} synced, {} skipped",
                records.len(),
                synced,
                engine.skipped().len()
            );
        }
    }

    Ok(())
}

fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
