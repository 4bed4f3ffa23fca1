//! spanage-core - Core library for spanage
//!
//! This crate provides the declared schema model, the live-state inspector
//! that turns catalog rows into a [`LiveSchema`], the diff engine that orders
//! DDL statements between the two, and project configuration parsing.

pub mod config;
pub mod diff;
pub mod error;
pub mod live;
pub mod schema;

pub use config::{Config, DatabaseConfig};
pub use diff::{diff_schema, Change, SchemaDiff};
pub use error::{CoreError, CoreResult};
pub use live::{
    inspect, CatalogColumn, CatalogIndex, CatalogTable, ColumnStatus, IndexKind, IndexStatus,
    LiveSchema, LiveTable, NotReadyIssue, NotReadyReport, TableStatus,
};
pub use schema::{ColumnDdl, IndexDdl, SchemaDdl, TableDdl};

/// Name of the system-owned ledger table.
///
/// Reserved: it may not be declared in a schema file and is excluded from
/// live-state inspection and diffing.
pub const LEDGER_TABLE: &str = "SchemaImage";
