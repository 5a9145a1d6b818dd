// vybe-core/src/error.rs
// ============================================================================
// Module: Vybe Core Errors
// Description: Error taxonomy shared by every core component.
// Purpose: Give every mutation a small, stable set of error kinds that the
//          CLI envelope can report as a `code` string.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`CoreError`] is the single error type returned by every core operation.
//! Storage-layer errors (see `vybe-store-sqlite`) map into this taxonomy
//! rather than leaking engine-specific error types across the crate boundary.

use thiserror::Error;

/// Core error taxonomy, reported in the CLI envelope as a stable `code`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad flag, missing required input, unknown scope, or a cycle in the
    /// dependency graph.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Referenced task/project/artifact/memory key does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Status transition forbidden; claim on a non-pending task; heartbeat
    /// without ownership.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// Two writers collided at the engine layer. Reserved: the embedded,
    /// single-writer-at-a-time engine this ledger uses does not currently
    /// produce this variant, but callers and the CLI error-code mapping
    /// still need a stable slot for it.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Database, I/O, or logic failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the stable error code string used in the CLI envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result alias used throughout the core and store crates.
pub type CoreResult<T> = Result<T, CoreError>;
