//! Declared schema model.
//!
//! A [`SchemaDdl`] is the desired state loaded from a schema file: tables,
//! their columns and their secondary indexes, each carrying a name and a raw
//! DDL fragment. Fragments are trusted input. They are emitted verbatim and
//! never parsed beyond the leading-token check in [`SchemaDdl::validate`].
//!
//! Equality is structural (derived `PartialEq`), field by field and with
//! arrays compared in order. Two files that differ only in whitespace or key
//! order load to equal values.

use crate::error::{CoreError, CoreResult};
use crate::LEDGER_TABLE;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The desired schema: an ordered list of tables.
///
/// Table order does not affect matching (tables are matched by name) but it
/// fixes the order in which new tables are created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDdl {
    /// Declared tables
    #[serde(default)]
    pub tables: Vec<TableDdl>,
}

/// A declared table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDdl {
    /// Table name, unique within the schema
    pub name: String,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<ColumnDdl>,

    /// Fragment that completes `CREATE TABLE name (columns...)`, e.g.
    /// `PRIMARY KEY(SingerId), INTERLEAVE IN PARENT Singers`. Unused when the
    /// table already exists. Leave it empty for dialects without that suffix
    /// form (DuckDB) and put constraints in the column fragments.
    #[serde(default, alias = "createTableDdl")]
    pub ddl: String,

    /// Secondary indexes in declaration order
    #[serde(default)]
    pub indexes: Vec<IndexDdl>,
}

/// A declared column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDdl {
    /// Column name, unique within its table
    pub name: String,

    /// Full `column_name type [options]` fragment. Its leading token is the
    /// column name.
    #[serde(default, alias = "addColumnDdl")]
    pub ddl: String,
}

/// A declared secondary index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDdl {
    /// Index name. Index names are global at the database level.
    pub name: String,

    /// Full `CREATE [UNIQUE] INDEX ...` statement
    #[serde(default, alias = "createIndexDdl")]
    pub ddl: String,
}

impl SchemaDdl {
    /// Load and validate a schema file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a schema from its JSON description.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let schema: SchemaDdl = serde_json::from_str(json).map_err(CoreError::SchemaParse)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Serialize to the byte form stored in the ledger.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(CoreError::SchemaSerialize)
    }

    /// Deserialize a ledger payload produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(bytes).map_err(CoreError::SchemaParse)
    }

    /// Look up a declared table by name.
    pub fn table(&self, name: &str) -> Option<&TableDdl> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Check the structural invariants of the model.
    ///
    /// Names must be non-empty and unique (tables within the schema, columns
    /// and indexes within a table, indexes across the whole schema), every
    /// column fragment must start with its column name, and the ledger table
    /// name is reserved.
    pub fn validate(&self) -> CoreResult<()> {
        let mut table_names: HashSet<&str> = HashSet::new();
        let mut index_names: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            if table.name.is_empty() {
                return Err(invalid("table name cannot be empty".to_string()));
            }
            if table.name == LEDGER_TABLE {
                return Err(invalid(format!(
                    "table name '{}' is reserved for the schema ledger",
                    LEDGER_TABLE
                )));
            }
            if !table_names.insert(&table.name) {
                return Err(invalid(format!("duplicate table '{}'", table.name)));
            }

            let mut column_names: HashSet<&str> = HashSet::new();
            for column in &table.columns {
                if column.name.is_empty() {
                    return Err(invalid(format!(
                        "table '{}' has a column with an empty name",
                        table.name
                    )));
                }
                if !column_names.insert(&column.name) {
                    return Err(invalid(format!(
                        "duplicate column '{}.{}'",
                        table.name, column.name
                    )));
                }
                if leading_identifier(&column.ddl) != Some(column.name.as_str()) {
                    return Err(invalid(format!(
                        "column '{}.{}' has a DDL fragment that does not start with its name: '{}'",
                        table.name, column.name, column.ddl
                    )));
                }
            }

            for index in &table.indexes {
                if index.name.is_empty() {
                    return Err(invalid(format!(
                        "table '{}' has an index with an empty name",
                        table.name
                    )));
                }
                if !index_names.insert(&index.name) {
                    return Err(invalid(format!("duplicate index '{}'", index.name)));
                }
            }
        }
        Ok(())
    }
}

impl TableDdl {
    /// Whether a column with this name is declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Whether an index with this name is declared.
    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.name == name)
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::SchemaInvalid { message }
}

/// First whitespace-separated token of a fragment, with identifier quoting
/// (backticks or double quotes) removed.
fn leading_identifier(fragment: &str) -> Option<&str> {
    fragment
        .split_whitespace()
        .next()
        .map(|token| token.trim_matches(|c| c == '`' || c == '"'))
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
