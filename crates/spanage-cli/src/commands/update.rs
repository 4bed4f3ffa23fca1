//! Update command implementation

use anyhow::{Context, Result};
use spanage_migrate::{MigrationOutcome, Migrator};

use crate::cli::{GlobalArgs, UpdateArgs};
use crate::commands::common::{load_config, load_schema, open_database, resolve_schema_file};

/// Execute the update command
pub async fn execute(args: &UpdateArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let schema_path = resolve_schema_file(args.schema_file.as_deref(), &config)?;
    let desired = load_schema(&schema_path)?;
    let db = open_database(global, &config)?;

    let outcome = Migrator::for_backend(&db)
        .migrate(&desired)
        .await
        .context("Schema update failed")?;

    match &outcome {
        MigrationOutcome::Converged { version_id } => {
            println!("Already up to date (schema version {})", version_id);
        }
        MigrationOutcome::Applied {
            version_id,
            statements,
        } => {
            println!(
                "Applied {} statement{} (schema version {}):",
                statements.len(),
                if statements.len() == 1 { "" } else { "s" },
                version_id
            );
            for sql in statements {
                println!("  {}", sql);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "update_test.rs"]
mod tests;
