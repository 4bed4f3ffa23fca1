//! DuckDB database backend implementation
//!
//! DuckDB applies DDL synchronously, so every catalog object it reports is
//! already stable. A DDL batch runs statement by statement in autocommit:
//! inside an open transaction DuckDB keeps a dropped index as a dependency of
//! its column, which would reject `DROP INDEX` followed by `DROP COLUMN`.
//! A failing statement stops the batch and leaves earlier ones applied.
//!
//! DuckDB has no `CREATE TABLE (...) PRIMARY KEY(...)` suffix form. Key and
//! other constraints belong in the column fragments, and a table's trailing
//! `ddl` fragment must stay empty.

use crate::error::{DbError, DbResult};
use crate::traits::{
    DdlOperation, LedgerStore, SchemaAdmin, SchemaCatalog, SchemaImageRow, SchemaState,
};
use async_trait::async_trait;
use duckdb::Connection;
use spanage_core::{
    CatalogColumn, CatalogIndex, CatalogTable, ColumnStatus, IndexKind, IndexStatus, LEDGER_TABLE,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Execute raw SQL outside of the DDL boundary (fixtures, ad hoc queries)
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Read the catalog synchronously
    fn list_tables_sync(&self) -> DbResult<Vec<CatalogTable>> {
        let conn = lock(&self.conn)?;

        let mut tables: Vec<CatalogTable> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT table_name FROM information_schema.tables
                 WHERE table_catalog = current_database()
                   AND table_schema = 'main'
                   AND table_type = 'BASE TABLE'
                 ORDER BY table_name",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            for name in names {
                positions.insert(name.clone(), tables.len());
                tables.push(CatalogTable::stable(name, Vec::<String>::new()));
            }
        }

        {
            let mut stmt = conn.prepare(
                "SELECT table_name, column_name FROM information_schema.columns
                 WHERE table_catalog = current_database()
                   AND table_schema = 'main'
                 ORDER BY table_name, ordinal_position",
            )?;
            let columns = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (table, column) in columns {
                // Views show up in information_schema.columns too
                if let Some(&pos) = positions.get(&table) {
                    tables[pos].columns.push(CatalogColumn {
                        name: column,
                        status: ColumnStatus::Stable,
                    });
                }
            }
        }

        {
            let mut stmt = conn.prepare(
                "SELECT table_name, index_name, is_primary FROM duckdb_indexes()
                 WHERE database_name = current_database()
                   AND schema_name = 'main'
                 ORDER BY table_name, index_name",
            )?;
            let indexes = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (table, index, is_primary) in indexes {
                if let Some(&pos) = positions.get(&table) {
                    tables[pos].indexes.push(CatalogIndex {
                        name: index,
                        status: IndexStatus::Ready,
                        kind: if is_primary {
                            IndexKind::PrimaryKey
                        } else {
                            IndexKind::Secondary
                        },
                    });
                }
            }
        }

        Ok(tables)
    }

    fn latest_image_sync(&self) -> DbResult<Option<SchemaImageRow>> {
        let conn = lock(&self.conn)?;
        let sql = format!(
            r#"SELECT "versionId", "schema", "state" FROM {} ORDER BY "versionId" DESC LIMIT 1"#,
            LEDGER_TABLE
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt.query_map([], read_image_columns)?.next().transpose()?;
        raw.map(into_image_row).transpose()
    }

    fn insert_image_if_latest_sync(
        &self,
        expected_latest: Option<i64>,
        row: &SchemaImageRow,
    ) -> DbResult<bool> {
        let conn = lock(&self.conn)?;
        with_transaction(&conn, |conn| {
            let current: Option<i64> = conn.query_row(
                &format!(r#"SELECT MAX("versionId") FROM {}"#, LEDGER_TABLE),
                [],
                |r| r.get(0),
            )?;
            if current != expected_latest {
                log::debug!(
                    "Ledger moved from {:?} to {:?}; not inserting version {}",
                    expected_latest,
                    current,
                    row.version_id
                );
                return Ok(false);
            }
            conn.execute(
                &format!(
                    r#"INSERT INTO {} ("versionId", "schema", "state") VALUES (?, ?, ?)"#,
                    LEDGER_TABLE
                ),
                duckdb::params![row.version_id, row.schema, row.state.as_i64()],
            )?;
            Ok(true)
        })
    }

    fn set_image_state_sync(&self, version_id: i64, state: SchemaState) -> DbResult<()> {
        let conn = lock(&self.conn)?;
        with_transaction(&conn, |conn| {
            let updated = conn.execute(
                &format!(
                    r#"UPDATE {} SET "state" = ? WHERE "versionId" = ?"#,
                    LEDGER_TABLE
                ),
                duckdb::params![state.as_i64(), version_id],
            )?;
            if updated == 0 {
                return Err(DbError::VersionNotFound { version_id });
            }
            Ok(())
        })
    }

    fn list_images_sync(&self) -> DbResult<Vec<SchemaImageRow>> {
        let conn = lock(&self.conn)?;
        let sql = format!(
            r#"SELECT "versionId", "schema", "state" FROM {} ORDER BY "versionId" DESC"#,
            LEDGER_TABLE
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], read_image_columns)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(into_image_row).collect()
    }
}

#[async_trait]
impl SchemaCatalog for DuckDbBackend {
    async fn list_tables(&self) -> DbResult<Vec<CatalogTable>> {
        self.list_tables_sync()
    }
}

#[async_trait]
impl SchemaAdmin for DuckDbBackend {
    async fn submit_ddl(&self, statements: Vec<String>) -> DbResult<DdlOperation> {
        if statements.is_empty() {
            return Err(DbError::ExecutionError(
                "refusing to submit an empty DDL batch".to_string(),
            ));
        }
        let conn = Arc::clone(&self.conn);
        let handle = tokio::task::spawn_blocking(move || apply_batch(&conn, &statements));
        Ok(DdlOperation::new(async move {
            handle
                .await
                .map_err(|e| DbError::Internal(format!("DDL task failed: {e}")))?
        }))
    }
}

#[async_trait]
impl LedgerStore for DuckDbBackend {
    fn ledger_table_ddl(&self) -> String {
        format!(
            r#"CREATE TABLE IF NOT EXISTS {} ("versionId" BIGINT NOT NULL PRIMARY KEY, "schema" BLOB NOT NULL, "state" BIGINT NOT NULL)"#,
            LEDGER_TABLE
        )
    }

    async fn latest_image(&self) -> DbResult<Option<SchemaImageRow>> {
        self.latest_image_sync()
    }

    async fn insert_image_if_latest(
        &self,
        expected_latest: Option<i64>,
        row: SchemaImageRow,
    ) -> DbResult<bool> {
        self.insert_image_if_latest_sync(expected_latest, &row)
    }

    async fn set_image_state(&self, version_id: i64, state: SchemaState) -> DbResult<()> {
        self.set_image_state_sync(version_id, state)
    }

    async fn list_images(&self) -> DbResult<Vec<SchemaImageRow>> {
        self.list_images_sync()
    }
}

fn lock(conn: &Mutex<Connection>) -> DbResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| DbError::MutexPoisoned(e.to_string()))
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
fn with_transaction<F, T>(conn: &Connection, body: F) -> DbResult<T>
where
    F: FnOnce(&Connection) -> DbResult<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::ExecutionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                rollback(conn);
                return Err(DbError::ExecutionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => rollback(conn),
    }
    result
}

fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        log::warn!("ROLLBACK failed, connection may still be inside a transaction: {e}");
    }
}

/// Apply a DDL batch in order, one autocommit statement at a time.
fn apply_batch(conn: &Mutex<Connection>, statements: &[String]) -> DbResult<()> {
    let conn = lock(conn)?;
    for (i, sql) in statements.iter().enumerate() {
        log::debug!("Executing: {}", sql);
        conn.execute_batch(sql).map_err(|e| {
            DbError::ExecutionError(format!(
                "{e}: {sql} (statement {} of {})",
                i + 1,
                statements.len()
            ))
        })?;
    }
    Ok(())
}

fn read_image_columns(row: &duckdb::Row<'_>) -> duckdb::Result<(i64, Vec<u8>, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_image_row((version_id, schema, state): (i64, Vec<u8>, i64)) -> DbResult<SchemaImageRow> {
    Ok(SchemaImageRow {
        version_id,
        schema,
        state: SchemaState::from_i64(version_id, state)?,
    })
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
