//! Error types for spanage-core

use thiserror::Error;

/// Core error type for spanage
#[derive(Error, Debug)]
pub enum CoreError {
    /// S001: Declared schema could not be parsed
    #[error("[S001] Failed to parse schema: {0}")]
    SchemaParse(#[source] serde_json::Error),

    /// S002: Declared schema violates a structural invariant
    #[error("[S002] Invalid schema: {message}")]
    SchemaInvalid { message: String },

    /// S003: Schema could not be serialized for the ledger
    #[error("[S003] Failed to serialize schema: {0}")]
    SchemaSerialize(#[source] serde_json::Error),

    /// S004: Configuration file not found
    #[error("[S004] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// S005: Failed to parse configuration file
    #[error("[S005] Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// S006: IO error with file path context
    #[error("[S006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

impl CoreError {
    /// Whether this error stems from malformed declared-schema input.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CoreError::SchemaParse(_) | CoreError::SchemaInvalid { .. }
        )
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
