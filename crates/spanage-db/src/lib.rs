//! spanage-db - Database boundary for spanage
//!
//! This crate provides the collaborator traits the migration engine talks to
//! (`SchemaCatalog`, `SchemaAdmin`, `LedgerStore`) and a DuckDB backend that
//! implements all three.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{
    DdlOperation, LedgerStore, SchemaAdmin, SchemaCatalog, SchemaImageRow, SchemaState,
};
