//! Diff engine - order the DDL that converges live state to the declared schema.
//!
//! Tables are processed in declaration order. A table missing from the live
//! schema is created together with its indexes. A table present in both is
//! reconciled in three phases:
//!
//! 1. `DROP INDEX` for live indexes that are no longer declared,
//! 2. `ADD COLUMN` for new columns, then `DROP COLUMN` for removed ones,
//! 3. `CREATE INDEX` for newly declared indexes.
//!
//! Indexes reference columns, so an index goes away before any column it may
//! cover, and a column exists before any index that covers it. Live tables
//! that are not declared at all are dropped last, indexes first.
//!
//! Only presence is tracked. A column or index that exists on both sides is
//! left untouched even if its declared fragment changed.

use crate::live::{LiveSchema, LiveTable};
use crate::schema::{ColumnDdl, IndexDdl, SchemaDdl, TableDdl};
use std::fmt;

/// A single schema change. Each change renders to exactly one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Create a table from its column fragments and trailing fragment.
    CreateTable {
        table: String,
        columns: Vec<String>,
        ddl: String,
    },
    /// Create an index from its full statement.
    CreateIndex {
        table: String,
        name: String,
        ddl: String,
    },
    /// Drop an index.
    DropIndex { table: String, name: String },
    /// Add a column from its full fragment.
    AddColumn {
        table: String,
        name: String,
        ddl: String,
    },
    /// Drop a column.
    DropColumn { table: String, name: String },
    /// Drop a table.
    DropTable { table: String },
}

impl Change {
    fn create_table(table: &TableDdl) -> Self {
        Change::CreateTable {
            table: table.name.clone(),
            columns: table.columns.iter().map(|c| c.ddl.clone()).collect(),
            ddl: table.ddl.clone(),
        }
    }

    fn create_index(table: &str, index: &IndexDdl) -> Self {
        Change::CreateIndex {
            table: table.to_string(),
            name: index.name.clone(),
            ddl: index.ddl.clone(),
        }
    }

    fn add_column(table: &str, column: &ColumnDdl) -> Self {
        Change::AddColumn {
            table: table.to_string(),
            name: column.name.clone(),
            ddl: column.ddl.clone(),
        }
    }

    /// The table this change applies to.
    pub fn table(&self) -> &str {
        match self {
            Change::CreateTable { table, .. }
            | Change::CreateIndex { table, .. }
            | Change::DropIndex { table, .. }
            | Change::AddColumn { table, .. }
            | Change::DropColumn { table, .. }
            | Change::DropTable { table } => table,
        }
    }

    /// Render the DDL statement for this change.
    pub fn to_sql(&self) -> String {
        match self {
            Change::CreateTable {
                table,
                columns,
                ddl,
            } => {
                let mut sql = format!("CREATE TABLE {} ({})", table, columns.join(", "));
                if !ddl.is_empty() {
                    sql.push(' ');
                    sql.push_str(ddl);
                }
                sql
            }
            Change::CreateIndex { ddl, .. } => ddl.clone(),
            Change::DropIndex { name, .. } => format!("DROP INDEX {}", name),
            Change::AddColumn { table, ddl, .. } => {
                format!("ALTER TABLE {} ADD COLUMN {}", table, ddl)
            }
            Change::DropColumn { table, name } => {
                format!("ALTER TABLE {} DROP COLUMN {}", table, name)
            }
            Change::DropTable { table } => format!("DROP TABLE {}", table),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::CreateTable { table, columns, .. } => {
                write!(f, "+ table {} ({} columns)", table, columns.len())
            }
            Change::CreateIndex { table, name, .. } => write!(f, "+ index {} on {}", name, table),
            Change::DropIndex { table, name } => write!(f, "- index {} on {}", name, table),
            Change::AddColumn { table, name, .. } => write!(f, "+ column {}.{}", table, name),
            Change::DropColumn { table, name } => write!(f, "- column {}.{}", table, name),
            Change::DropTable { table } => write!(f, "- table {}", table),
        }
    }
}

/// Ordered changes that transform the live schema into the declared one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub changes: Vec<Change>,
}

impl SchemaDiff {
    /// True when live state already matches the declared schema.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Statements in submission order.
    pub fn statements(&self) -> Vec<String> {
        self.changes.iter().map(Change::to_sql).collect()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No changes detected.");
        }
        writeln!(f, "Changes detected:")?;
        for change in &self.changes {
            writeln!(f, "  {}", change)?;
        }
        Ok(())
    }
}

/// Compute the ordered changes from `live` to `desired`.
pub fn diff_schema(live: &LiveSchema, desired: &SchemaDdl) -> SchemaDiff {
    let mut changes = Vec::new();

    for table in &desired.tables {
        match live.table(&table.name) {
            None => {
                changes.push(Change::create_table(table));
                changes.extend(
                    table
                        .indexes
                        .iter()
                        .map(|index| Change::create_index(&table.name, index)),
                );
            }
            Some(live_table) => diff_table(live_table, table, &mut changes),
        }
    }

    for live_table in live.tables.values() {
        if desired.table(&live_table.name).is_some() {
            continue;
        }
        for index in &live_table.indexes {
            changes.push(Change::DropIndex {
                table: live_table.name.clone(),
                name: index.clone(),
            });
        }
        changes.push(Change::DropTable {
            table: live_table.name.clone(),
        });
    }

    for change in &changes {
        log::debug!("diff: {}", change);
    }
    SchemaDiff { changes }
}

/// Reconcile a table that exists on both sides.
fn diff_table(live: &LiveTable, desired: &TableDdl, changes: &mut Vec<Change>) {
    let new_indexes: Vec<&IndexDdl> = desired
        .indexes
        .iter()
        .filter(|index| !live.has_index(&index.name))
        .collect();

    for index in &live.indexes {
        if !desired.has_index(index) {
            changes.push(Change::DropIndex {
                table: desired.name.clone(),
                name: index.clone(),
            });
        }
    }

    for column in &desired.columns {
        if !live.has_column(&column.name) {
            changes.push(Change::add_column(&desired.name, column));
        }
    }
    for column in &live.columns {
        if !desired.has_column(column) {
            changes.push(Change::DropColumn {
                table: desired.name.clone(),
                name: column.clone(),
            });
        }
    }

    for index in new_indexes {
        changes.push(Change::create_index(&desired.name, index));
    }
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
