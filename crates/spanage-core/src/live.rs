//! Live-state inspection.
//!
//! A catalog collaborator reports typed [`CatalogTable`] rows for every table
//! in the database. [`inspect`] validates them once at this boundary: the
//! ledger table and non-secondary indexes are dropped, and any object whose
//! schema change has not fully completed turns the whole snapshot into a
//! [`NotReadyReport`]. No statements may be computed against such a database.

use std::collections::BTreeMap;
use std::fmt;

/// Materialization state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// Committed and safe to reference
    Stable,
    /// Still being created or altered
    Pending,
}

/// Materialization state of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    /// Committed and safe to reference
    Stable,
    /// Still being added or altered
    Pending,
}

/// Readiness of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Serving reads and writes
    Ready,
    /// Still backfilling or otherwise not serving
    Building,
}

/// Kind of index reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// User-declared secondary index
    Secondary,
    /// Implicit primary-key index
    PrimaryKey,
    /// Backing index of an interleaved relationship
    Interleave,
}

/// A column row as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub status: ColumnStatus,
}

/// An index row as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIndex {
    pub name: String,
    pub status: IndexStatus,
    pub kind: IndexKind,
}

/// A table row as reported by the catalog, with its columns in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub name: String,
    pub status: TableStatus,
    pub columns: Vec<CatalogColumn>,
    pub indexes: Vec<CatalogIndex>,
}

impl CatalogTable {
    /// A stable table with stable columns and no indexes.
    pub fn stable<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            status: TableStatus::Stable,
            columns: columns
                .into_iter()
                .map(|c| CatalogColumn {
                    name: c.into(),
                    status: ColumnStatus::Stable,
                })
                .collect(),
            indexes: Vec::new(),
        }
    }

    /// Add a ready secondary index.
    pub fn with_index(mut self, name: impl Into<String>) -> Self {
        self.indexes.push(CatalogIndex {
            name: name.into(),
            status: IndexStatus::Ready,
            kind: IndexKind::Secondary,
        });
        self
    }
}

/// A table that currently exists in the database.
///
/// Columns keep catalog ordinal order; indexes keep catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveTable {
    pub name: String,
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
}

impl LiveTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i == name)
    }
}

/// Snapshot of the live schema, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSchema {
    pub tables: BTreeMap<String, LiveTable>,
}

impl LiveSchema {
    pub fn table(&self, name: &str) -> Option<&LiveTable> {
        self.tables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// An object whose schema change has not completed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotReadyIssue {
    Table { table: String },
    Column { table: String, column: String },
    Index { table: String, index: String },
}

impl fmt::Display for NotReadyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyIssue::Table { table } => write!(f, "Table {} is not committed yet", table),
            NotReadyIssue::Column { table, column } => {
                write!(f, "Column {}.{} is not committed yet", table, column)
            }
            NotReadyIssue::Index { table, index } => {
                write!(f, "Index {} on {} is not serving yet", index, table)
            }
        }
    }
}

/// Every offending object found by [`inspect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotReadyReport {
    pub issues: Vec<NotReadyIssue>,
}

impl fmt::Display for NotReadyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema object(s) not ready: ", self.issues.len())?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for NotReadyReport {}

/// Build a [`LiveSchema`] from catalog rows.
///
/// `ledger_table` is skipped entirely. Primary-key and interleave indexes are
/// not tracked. Returns every offending object if any table or column is not
/// stable or any secondary index is not ready.
pub fn inspect(
    rows: Vec<CatalogTable>,
    ledger_table: &str,
) -> Result<LiveSchema, NotReadyReport> {
    let mut report = NotReadyReport::default();
    let mut live = LiveSchema::default();

    for row in rows {
        if row.name == ledger_table {
            continue;
        }
        if row.status != TableStatus::Stable {
            report.issues.push(NotReadyIssue::Table {
                table: row.name.clone(),
            });
        }

        let mut table = LiveTable {
            name: row.name.clone(),
            ..LiveTable::default()
        };
        for column in row.columns {
            if column.status != ColumnStatus::Stable {
                report.issues.push(NotReadyIssue::Column {
                    table: row.name.clone(),
                    column: column.name.clone(),
                });
            }
            table.columns.push(column.name);
        }
        for index in row.indexes {
            if index.kind != IndexKind::Secondary {
                continue;
            }
            if index.status != IndexStatus::Ready {
                report.issues.push(NotReadyIssue::Index {
                    table: row.name.clone(),
                    index: index.name.clone(),
                });
            }
            table.indexes.push(index.name);
        }
        live.tables.insert(row.name, table);
    }

    if report.issues.is_empty() {
        log::debug!("Inspected {} live table(s)", live.tables.len());
        Ok(live)
    } else {
        Err(report)
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
