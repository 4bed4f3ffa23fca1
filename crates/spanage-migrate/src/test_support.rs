//! In-memory stand-in for the database boundaries, used by unit tests.

use async_trait::async_trait;
use spanage_core::CatalogTable;
use spanage_db::{
    DbError, DbResult, DdlOperation, LedgerStore, SchemaAdmin, SchemaCatalog, SchemaImageRow,
    SchemaState,
};
use std::sync::Mutex;

pub const FAKE_LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS SchemaImage (...)";

/// How the fake should fail a non-ledger DDL batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyFailure {
    /// `submit_ddl` itself returns an error
    Submit,
    /// The batch is accepted but its operation reports failure
    Operation,
}

/// Catalog, DDL boundary and ledger store backed by plain vectors.
///
/// Submitted DDL is recorded but never executed; tests set `tables` to the
/// live state they want the catalog to report.
#[derive(Default)]
pub struct FakeDatabase {
    pub tables: Mutex<Vec<CatalogTable>>,
    pub images: Mutex<Vec<SchemaImageRow>>,
    pub submitted: Mutex<Vec<Vec<String>>>,
    pub apply_failure: Option<ApplyFailure>,
    /// Version another writer slips in right before our insert
    pub concurrent_insert: Option<i64>,
}

impl FakeDatabase {
    pub fn with_tables(tables: Vec<CatalogTable>) -> Self {
        Self {
            tables: Mutex::new(tables),
            ..Self::default()
        }
    }

    /// Submitted batches other than the ledger table creation.
    pub fn schema_batches(&self) -> Vec<Vec<String>> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|batch| !is_ledger_batch(batch))
            .cloned()
            .collect()
    }

    pub fn images(&self) -> Vec<SchemaImageRow> {
        self.images.lock().unwrap().clone()
    }

    fn max_version(images: &[SchemaImageRow]) -> Option<i64> {
        images.iter().map(|r| r.version_id).max()
    }
}

fn is_ledger_batch(batch: &[String]) -> bool {
    batch.len() == 1 && batch[0] == FAKE_LEDGER_DDL
}

#[async_trait]
impl SchemaCatalog for FakeDatabase {
    async fn list_tables(&self) -> DbResult<Vec<CatalogTable>> {
        Ok(self.tables.lock().unwrap().clone())
    }
}

#[async_trait]
impl SchemaAdmin for FakeDatabase {
    async fn submit_ddl(&self, statements: Vec<String>) -> DbResult<DdlOperation> {
        let is_ledger = is_ledger_batch(&statements);
        self.submitted.lock().unwrap().push(statements);
        if is_ledger {
            return Ok(DdlOperation::finished(Ok(())));
        }
        match self.apply_failure {
            Some(ApplyFailure::Submit) => Err(DbError::ExecutionError("rejected".to_string())),
            Some(ApplyFailure::Operation) => Ok(DdlOperation::finished(Err(
                DbError::ExecutionError("operation failed".to_string()),
            ))),
            None => Ok(DdlOperation::finished(Ok(()))),
        }
    }
}

#[async_trait]
impl LedgerStore for FakeDatabase {
    fn ledger_table_ddl(&self) -> String {
        FAKE_LEDGER_DDL.to_string()
    }

    async fn latest_image(&self) -> DbResult<Option<SchemaImageRow>> {
        let images = self.images.lock().unwrap();
        Ok(images.iter().max_by_key(|r| r.version_id).cloned())
    }

    async fn insert_image_if_latest(
        &self,
        expected_latest: Option<i64>,
        row: SchemaImageRow,
    ) -> DbResult<bool> {
        let mut images = self.images.lock().unwrap();
        if let Some(version_id) = self.concurrent_insert {
            if !images.iter().any(|r| r.version_id == version_id) {
                images.push(SchemaImageRow {
                    version_id,
                    schema: row.schema.clone(),
                    state: SchemaState::Pending,
                });
            }
        }
        if Self::max_version(&images) != expected_latest {
            return Ok(false);
        }
        images.push(row);
        Ok(true)
    }

    async fn set_image_state(&self, version_id: i64, state: SchemaState) -> DbResult<()> {
        let mut images = self.images.lock().unwrap();
        let row = images
            .iter_mut()
            .find(|r| r.version_id == version_id)
            .ok_or(DbError::VersionNotFound { version_id })?;
        row.state = state;
        Ok(())
    }

    async fn list_images(&self) -> DbResult<Vec<SchemaImageRow>> {
        let mut images = self.images.lock().unwrap().clone();
        images.sort_by(|a, b| b.version_id.cmp(&a.version_id));
        Ok(images)
    }
}
