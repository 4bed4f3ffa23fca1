//! Version ledger.
//!
//! Every distinct declared schema handed to the migrator is stored as a
//! `SchemaImage` row with a strictly increasing version. Rows are appended
//! as `PENDING` and only ever move to `DONE`; nothing is deleted.

use crate::error::{MigrateError, MigrateResult};
use spanage_core::SchemaDdl;
use spanage_db::{LedgerStore, SchemaAdmin, SchemaImageRow, SchemaState};

/// A decoded ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub version_id: i64,
    pub state: SchemaState,
    pub schema: SchemaDdl,
}

/// Ledger operations over a store and the DDL boundary that creates it.
pub struct Ledger<'a> {
    admin: &'a dyn SchemaAdmin,
    store: &'a dyn LedgerStore,
}

impl<'a> Ledger<'a> {
    pub fn new(admin: &'a dyn SchemaAdmin, store: &'a dyn LedgerStore) -> Self {
        Self { admin, store }
    }

    /// Create the ledger table if it does not exist yet, waiting for the
    /// statement to complete.
    pub async fn ensure_table(&self) -> MigrateResult<()> {
        let op = self.admin.submit_ddl(vec![self.store.ledger_table_ddl()]).await?;
        op.wait().await?;
        log::debug!("Ledger table ready");
        Ok(())
    }

    /// Record `desired` as a new `PENDING` version unless it equals the latest
    /// recorded schema, and return the version that describes it.
    ///
    /// The insert is conditioned on the latest version still being the one
    /// read here; losing that race is [`MigrateError::LedgerConflict`].
    pub async fn record_if_changed(&self, desired: &SchemaDdl) -> MigrateResult<i64> {
        let (expected, next) = match self.store.latest_image().await? {
            None => (None, 1),
            Some(row) => {
                let recorded = decode(&row)?;
                if recorded == *desired {
                    log::debug!("Schema unchanged since version {}", row.version_id);
                    return Ok(row.version_id);
                }
                (Some(row.version_id), row.version_id + 1)
            }
        };

        let row = SchemaImageRow {
            version_id: next,
            schema: desired.to_bytes()?,
            state: SchemaState::Pending,
        };
        if !self.store.insert_image_if_latest(expected, row).await? {
            return Err(MigrateError::LedgerConflict { expected });
        }

        log::info!("Recorded schema version {} ({})", next, SchemaState::Pending);
        Ok(next)
    }

    /// Mark `version_id` as applied.
    pub async fn mark_done(&self, version_id: i64) -> MigrateResult<()> {
        self.store
            .set_image_state(version_id, SchemaState::Done)
            .await?;
        log::info!("Marked schema version {} {}", version_id, SchemaState::Done);
        Ok(())
    }

    /// All recorded versions, newest first.
    pub async fn history(&self) -> MigrateResult<Vec<LedgerEntry>> {
        let rows = self.store.list_images().await?;
        rows.iter()
            .map(|row| -> MigrateResult<LedgerEntry> {
                Ok(LedgerEntry {
                    version_id: row.version_id,
                    state: row.state,
                    schema: decode(row)?,
                })
            })
            .collect()
    }
}

fn decode(row: &SchemaImageRow) -> MigrateResult<SchemaDdl> {
    SchemaDdl::from_bytes(&row.schema).map_err(|e| MigrateError::LedgerCorrupt {
        version_id: row.version_id,
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
