// vybe-core/src/memory.rs
// ============================================================================
// Module: Vybe Memory Store Types
// Description: Scoped key-value entry with TTL bookkeeping.
// Purpose: Shared types for the memory store's set/get/list/query/gc surface.
// Dependencies: serde, crate::error, crate::time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::error::CoreError;
use crate::time::Timestamp;

/// Memory partitioning dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    /// Visible to every task and project.
    Global,
    /// Visible to tasks sharing a `project_id`.
    Project,
    /// Visible only to one task.
    Task,
}

impl MemoryScope {
    /// Returns the stable lowercase string used in storage and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
            Self::Task => "task",
        }
    }

    /// Parses a scope from its stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an unrecognized scope.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            "task" => Ok(Self::Task),
            other => Err(CoreError::InvalidArgument(format!("unknown memory scope: {other}"))),
        }
    }

    /// Validates a `(scope, scope_id)` pair per the data model invariant:
    /// project/task scopes require a non-empty `scope_id`; global requires
    /// an empty one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] when the invariant is violated.
    pub fn validate_scope_id(self, scope_id: &str) -> Result<(), CoreError> {
        match self {
            Self::Global => Ok(()),
            Self::Project | Self::Task => {
                if scope_id.is_empty() {
                    Err(CoreError::InvalidArgument(format!(
                        "scope {} requires a non-empty scope_id",
                        self.as_str()
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single memory row, keyed by `(scope, scope_id, key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Partitioning dimension.
    pub scope: MemoryScope,
    /// Empty for global scope; otherwise a project or task identifier.
    pub scope_id: String,
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last value mutation time.
    pub updated_at: Timestamp,
    /// Expiry time, if a TTL was set.
    pub expires_at: Option<Timestamp>,
    /// The TTL window (milliseconds) originally supplied, used by `touch` to
    /// re-extend `expires_at` by the same window it was first set with.
    pub ttl_millis: Option<i64>,
    /// Last time this entry was explicitly touched (or set).
    pub touched_at: Timestamp,
}

impl MemoryEntry {
    /// Returns whether this entry has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at.is_before(now))
    }
}
