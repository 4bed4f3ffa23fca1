//! Migration driver.
//!
//! One run walks `START -> LEDGER_READY -> VERSIONED -> INSPECTED` and then
//! either stops at `CONVERGED` or continues `DIFFED -> APPLIED ->
//! MARKED_DONE`. Every step completes before the next one starts. A failure
//! after the version was recorded leaves it `PENDING`; re-running recomputes
//! the statements from the live state at that time.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use spanage_core::{diff_schema, inspect, LiveSchema, SchemaDdl, SchemaDiff, LEDGER_TABLE};
use spanage_db::{LedgerStore, SchemaAdmin, SchemaCatalog};
use std::fmt;

/// How a migration run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Live schema already matched; nothing was submitted
    Converged { version_id: i64 },
    /// `statements` were applied and the version marked done
    Applied {
        version_id: i64,
        statements: Vec<String>,
    },
}

impl MigrationOutcome {
    /// Ledger version describing the declared schema of this run
    pub fn version_id(&self) -> i64 {
        match self {
            MigrationOutcome::Converged { version_id }
            | MigrationOutcome::Applied { version_id, .. } => *version_id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Start,
    LedgerReady,
    Versioned,
    Inspected,
    Converged,
    Diffed,
    Applied,
    MarkedDone,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Start => "START",
            Phase::LedgerReady => "LEDGER_READY",
            Phase::Versioned => "VERSIONED",
            Phase::Inspected => "INSPECTED",
            Phase::Converged => "CONVERGED",
            Phase::Diffed => "DIFFED",
            Phase::Applied => "APPLIED",
            Phase::MarkedDone => "MARKED_DONE",
        };
        f.write_str(name)
    }
}

fn transition(from: Phase, to: Phase) -> Phase {
    log::debug!("{} -> {}", from, to);
    to
}

/// Reconciles a database with a declared schema.
pub struct Migrator<'a> {
    catalog: &'a dyn SchemaCatalog,
    admin: &'a dyn SchemaAdmin,
    ledger: Ledger<'a>,
}

impl<'a> Migrator<'a> {
    pub fn new(
        catalog: &'a dyn SchemaCatalog,
        admin: &'a dyn SchemaAdmin,
        store: &'a dyn LedgerStore,
    ) -> Self {
        Self {
            catalog,
            admin,
            ledger: Ledger::new(admin, store),
        }
    }

    /// Build a migrator over a backend that implements every boundary.
    pub fn for_backend<B>(backend: &'a B) -> Self
    where
        B: SchemaCatalog + SchemaAdmin + LedgerStore,
    {
        Self::new(backend, backend, backend)
    }

    pub fn ledger(&self) -> &Ledger<'a> {
        &self.ledger
    }

    /// Converge the database to `desired`, recording it in the ledger.
    pub async fn migrate(&self, desired: &SchemaDdl) -> MigrateResult<MigrationOutcome> {
        let phase = Phase::Start;

        self.ledger.ensure_table().await?;
        let phase = transition(phase, Phase::LedgerReady);

        let version_id = self.ledger.record_if_changed(desired).await?;
        let phase = transition(phase, Phase::Versioned);

        let live = self.inspect_live().await?;
        let phase = transition(phase, Phase::Inspected);

        let diff = diff_schema(&live, desired);
        if diff.is_empty() {
            transition(phase, Phase::Converged);
            log::info!("Schema version {} already up to date", version_id);
            return Ok(MigrationOutcome::Converged { version_id });
        }
        let phase = transition(phase, Phase::Diffed);

        let statements = diff.statements();
        for sql in &statements {
            log::debug!("Planned: {}", sql);
        }
        let op = self
            .admin
            .submit_ddl(statements.clone())
            .await
            .map_err(MigrateError::Apply)?;
        op.wait().await.map_err(MigrateError::Apply)?;
        log::info!(
            "Applied {} statement(s) for schema version {}",
            statements.len(),
            version_id
        );
        let phase = transition(phase, Phase::Applied);

        self.ledger.mark_done(version_id).await?;
        transition(phase, Phase::MarkedDone);

        Ok(MigrationOutcome::Applied {
            version_id,
            statements,
        })
    }

    /// Compute the changes `migrate` would submit, without touching the
    /// ledger or submitting DDL.
    pub async fn plan(&self, desired: &SchemaDdl) -> MigrateResult<SchemaDiff> {
        let live = self.inspect_live().await?;
        Ok(diff_schema(&live, desired))
    }

    async fn inspect_live(&self) -> MigrateResult<LiveSchema> {
        let rows = self.catalog.list_tables().await?;
        inspect(rows, LEDGER_TABLE).map_err(|report| {
            log::warn!("Aborting: {}", report);
            MigrateError::NotReady(report)
        })
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
