//! Error types for spanage-migrate

use spanage_core::{CoreError, NotReadyReport};
use spanage_db::DbError;
use thiserror::Error;

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Declared schema could not be parsed or serialized (M001)
    #[error("[M001] {0}")]
    Schema(#[from] CoreError),

    /// Live schema has objects whose schema change has not completed (M002)
    #[error("[M002] Live schema is not quiescent, no statements submitted. {0}")]
    NotReady(#[from] NotReadyReport),

    /// Catalog or ledger access failed (M003)
    #[error("[M003] Database access failed: {0}")]
    DataAccess(#[from] DbError),

    /// DDL batch was rejected or failed while applying (M004)
    #[error("[M004] Failed to apply DDL batch: {0}")]
    Apply(#[source] DbError),

    /// Another run recorded a version between our read and our insert (M005)
    #[error(
        "[M005] Ledger changed concurrently (expected latest version {}), re-run the migration",
        display_version(.expected)
    )]
    LedgerConflict { expected: Option<i64> },

    /// Stored ledger payload is unreadable (M006)
    #[error("[M006] Ledger version {version_id} is unreadable: {message}")]
    LedgerCorrupt { version_id: i64, message: String },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

fn display_version(version: &Option<i64>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
