// vybe-core/src/envelope.rs
// ============================================================================
// Module: Vybe CLI Envelope
// Description: The JSON reply shape every CLI invocation prints to stdout.
// Purpose: Give the CLI a single serializable type instead of ad hoc JSON.
// Dependencies: serde, serde_json, crate::error
// ============================================================================

//! ## Overview
//! Every command prints exactly one [`Envelope`] as JSON on stdout. Log
//! lines never mix into that stream; they go to stderr (see `vybe-cli`).

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// The JSON object every CLI command prints to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    /// Whether the command succeeded.
    pub success: bool,
    /// Command-specific payload, or `null` on failure.
    pub data: Option<Value>,
    /// Human-readable error message, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable error code, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Envelope {
    /// Builds a success envelope wrapping the given data.
    #[must_use]
    pub fn success(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None, code: None }
    }

    /// Builds a success envelope with no data payload.
    #[must_use]
    pub const fn success_empty() -> Self {
        Self { success: true, data: None, error: None, code: None }
    }

    /// Builds a failure envelope from a [`CoreError`].
    #[must_use]
    pub fn failure(err: &CoreError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            code: Some(err.code().to_string()),
        }
    }
}
