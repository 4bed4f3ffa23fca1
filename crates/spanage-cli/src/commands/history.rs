//! History command implementation

use anyhow::{Context, Result};
use spanage_core::LEDGER_TABLE;
use spanage_db::SchemaCatalog;
use spanage_migrate::{LedgerEntry, Migrator};

use crate::cli::{GlobalArgs, HistoryArgs};
use crate::commands::common::{load_config, open_database};

/// Execute the history command
pub async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let db = open_database(global, &config)?;

    // Reading history must not create the ledger table
    let tables = db.list_tables().await.context("Failed to read catalog")?;
    if !tables.iter().any(|t| t.name == LEDGER_TABLE) {
        println!("No schema versions recorded.");
        return Ok(());
    }

    let entries = Migrator::for_backend(&db)
        .ledger()
        .history()
        .await
        .context("Failed to read schema history")?;
    if entries.is_empty() {
        println!("No schema versions recorded.");
        return Ok(());
    }

    for line in format_history(&entries, args.limit) {
        println!("{}", line);
    }
    Ok(())
}

/// Render ledger entries as an aligned table.
fn format_history(entries: &[LedgerEntry], limit: Option<usize>) -> Vec<String> {
    let shown = limit.unwrap_or(entries.len()).min(entries.len());
    let mut lines = vec![format!("{:<8} {:<8} {}", "VERSION", "STATE", "TABLES")];
    lines.extend(entries[..shown].iter().map(|entry| {
        format!(
            "{:<8} {:<8} {}",
            entry.version_id,
            entry.state.to_string(),
            entry.schema.tables.len()
        )
    }));
    if shown < entries.len() {
        lines.push(format!("({} older version(s) not shown)", entries.len() - shown));
    }
    lines
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
