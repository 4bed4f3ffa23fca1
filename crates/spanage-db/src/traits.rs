//! Collaborator traits consumed by the migration engine

use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use spanage_core::CatalogTable;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Read-only view of the database's own metadata catalog.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Every table in the database with its columns and indexes.
    async fn list_tables(&self) -> DbResult<Vec<CatalogTable>>;
}

/// Administrative DDL boundary.
#[async_trait]
pub trait SchemaAdmin: Send + Sync {
    /// Submit `statements` as a single administrative batch.
    ///
    /// Returns once the batch is accepted; await the returned operation for
    /// completion.
    async fn submit_ddl(&self, statements: Vec<String>) -> DbResult<DdlOperation>;
}

/// Transactional storage for the schema ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// `CREATE TABLE IF NOT EXISTS` statement for the ledger table.
    fn ledger_table_ddl(&self) -> String;

    /// The row with the highest version, if any.
    async fn latest_image(&self) -> DbResult<Option<SchemaImageRow>>;

    /// Insert `row` only if the highest stored version still equals
    /// `expected_latest` (`None` meaning the ledger is empty).
    ///
    /// Returns `false` without writing when another writer got there first.
    async fn insert_image_if_latest(
        &self,
        expected_latest: Option<i64>,
        row: SchemaImageRow,
    ) -> DbResult<bool>;

    /// Set the lifecycle state of an existing version.
    async fn set_image_state(&self, version_id: i64, state: SchemaState) -> DbResult<()>;

    /// All rows, newest first.
    async fn list_images(&self) -> DbResult<Vec<SchemaImageRow>>;
}

/// Awaitable handle for a submitted DDL batch.
pub struct DdlOperation {
    completion: Pin<Box<dyn Future<Output = DbResult<()>> + Send>>,
}

impl DdlOperation {
    pub fn new(completion: impl Future<Output = DbResult<()>> + Send + 'static) -> Self {
        Self {
            completion: Box::pin(completion),
        }
    }

    /// An operation that has already finished with `result`.
    pub fn finished(result: DbResult<()>) -> Self {
        Self::new(async move { result })
    }

    /// Wait until every statement of the batch is durably applied.
    pub async fn wait(self) -> DbResult<()> {
        self.completion.await
    }
}

impl fmt::Debug for DdlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdlOperation").finish_non_exhaustive()
    }
}

/// Lifecycle state of a ledger version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Statements submitted or being submitted, not yet confirmed
    Pending = 1,
    /// Statements confirmed applied
    Done = 2,
}

impl SchemaState {
    /// Integer encoding stored in the ledger table
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Decode a stored state value
    pub fn from_i64(version_id: i64, state: i64) -> DbResult<Self> {
        match state {
            1 => Ok(SchemaState::Pending),
            2 => Ok(SchemaState::Done),
            _ => Err(DbError::InvalidState { version_id, state }),
        }
    }
}

impl fmt::Display for SchemaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaState::Pending => f.write_str("PENDING"),
            SchemaState::Done => f.write_str("DONE"),
        }
    }
}

/// One ledger row: a serialized schema snapshot and its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaImageRow {
    pub version_id: i64,
    pub schema: Vec<u8>,
    pub state: SchemaState,
}
