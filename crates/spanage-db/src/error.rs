//! Error types for spanage-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// DDL or statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Catalog or ledger read error (D003)
    #[error("[D003] Query failed: {0}")]
    QueryError(String),

    /// Ledger row with an unknown state value (D004)
    #[error("[D004] Ledger version {version_id} has unknown state {state}")]
    InvalidState { version_id: i64, state: i64 },

    /// Ledger version does not exist (D005)
    #[error("[D005] Ledger version {version_id} not found")]
    VersionNotFound { version_id: i64 },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Internal error (D007)
    #[error("[D007] Internal database error: {0}")]
    Internal(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::QueryError(err.to_string())
    }
}
