// vybe-core/src/idempotency.rs
// ============================================================================
// Module: Vybe Idempotency Log Types
// Description: Cached response envelope keyed by (request_id, command).
// Purpose: Let the storage layer replay a prior mutation's reply instead of
//          re-applying it when a caller retries the same request.
// Dependencies: serde_json, crate::ids, crate::time
// ============================================================================

use serde_json::Value;

use crate::ids::AgentName;
use crate::time::Timestamp;

/// A cached command response, keyed by `(request_id, command)`.
///
/// The pair is the full key: the same `request_id` reused for a different
/// `command` is a distinct entry, but reused for the *same* command by a
/// different agent replays the cached response rather than re-running the
/// mutation. `agent_name` is carried for diagnostics only.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    /// Agent that issued the original request.
    pub agent_name: AgentName,
    /// Caller-supplied request identifier.
    pub request_id: String,
    /// Dotted command path, e.g. `"task.create"`.
    pub command: String,
    /// The full envelope JSON returned the first time, replayed verbatim on
    /// a repeat request.
    pub response: Value,
    /// When the original request was first recorded.
    pub created_at: Timestamp,
}
