// vybe-store-sqlite/src/error.rs
// ============================================================================
// Module: Store Error Mapping
// Description: Translates rusqlite and schema errors into CoreError.
// Purpose: Keep rusqlite::Error from leaking across the crate boundary.
// Dependencies: rusqlite, thiserror, vybe_core
// ============================================================================

use thiserror::Error;
use vybe_core::CoreError;

/// Errors specific to the SQLite-backed store, prior to being mapped down to
/// [`CoreError`] at every public method boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Any rusqlite failure, including constraint violations.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The on-disk schema version is newer or incompatible with this binary.
    #[error("schema version mismatch: {0}")]
    SchemaVersionMismatch(String),
    /// A row's JSON column failed to deserialize into its domain type.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Sqlite(inner) => {
                if let rusqlite::Error::SqliteFailure(sqlite_err, _) = &inner
                    && sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation
                {
                    return Self::Conflict(inner.to_string());
                }
                Self::Internal(inner.to_string())
            }
            StoreError::SchemaVersionMismatch(msg) | StoreError::CorruptRow(msg) => {
                Self::Internal(msg)
            }
        }
    }
}

/// Result alias used throughout this crate prior to conversion to
/// [`vybe_core::CoreResult`] at the public API boundary.
pub type StoreResult<T> = Result<T, StoreError>;
