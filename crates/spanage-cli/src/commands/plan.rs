//! Plan command implementation

use anyhow::{Context, Result};
use spanage_migrate::Migrator;

use crate::cli::{GlobalArgs, PlanArgs};
use crate::commands::common::{load_config, load_schema, open_database, resolve_schema_file};

/// Execute the plan command
pub async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let schema_path = resolve_schema_file(args.schema_file.as_deref(), &config)?;
    let desired = load_schema(&schema_path)?;
    let db = open_database(global, &config)?;

    let diff = Migrator::for_backend(&db)
        .plan(&desired)
        .await
        .context("Failed to plan schema changes")?;

    print!("{}", diff);
    if !diff.is_empty() {
        println!();
        println!("Statements:");
        for sql in diff.statements() {
            println!("  {}", sql);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
