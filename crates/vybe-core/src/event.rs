// vybe-core/src/event.rs
// ============================================================================
// Module: Vybe Event Log Types
// Description: Append-only event entity and listing filters.
// Purpose: Provide the shared event kind enumeration and query shape used by
//          both the storage layer and the hook adapter.
// Dependencies: serde, serde_json, crate::ids, crate::time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::ids::AgentName;
use crate::ids::EventId;
use crate::ids::TaskId;
use crate::time::Timestamp;

/// Recognized event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A task was created.
    TaskCreated,
    /// A task transitioned to in_progress.
    TaskStarted,
    /// A task transitioned to completed or cancelled.
    TaskCompleted,
    /// Free-form progress note.
    Progress,
    /// A user prompt was submitted to the agent.
    UserPrompt,
    /// A tool call succeeded.
    ToolSuccess,
    /// A tool call failed.
    ToolFailure,
    /// A tool was invoked (recorded distinctly from its outcome).
    ToolCall,
    /// A subagent was spawned.
    AgentSpawned,
    /// A subagent completed.
    AgentCompleted,
    /// A liveness ping with no semantic payload.
    Heartbeat,
    /// Inserted by `events summarize`; covers an archived ID range.
    Summary,
}

impl EventKind {
    /// Returns the stable lowercase string used in storage and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskStarted => "task_started",
            Self::TaskCompleted => "task_completed",
            Self::Progress => "progress",
            Self::UserPrompt => "user_prompt",
            Self::ToolSuccess => "tool_success",
            Self::ToolFailure => "tool_failure",
            Self::ToolCall => "tool_call",
            Self::AgentSpawned => "agent_spawned",
            Self::AgentCompleted => "agent_completed",
            Self::Heartbeat => "heartbeat",
            Self::Summary => "summary",
        }
    }

    /// Parses an event kind from its stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an unrecognized kind.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "task_created" => Ok(Self::TaskCreated),
            "task_started" => Ok(Self::TaskStarted),
            "task_completed" => Ok(Self::TaskCompleted),
            "progress" => Ok(Self::Progress),
            "user_prompt" => Ok(Self::UserPrompt),
            "tool_success" => Ok(Self::ToolSuccess),
            "tool_failure" => Ok(Self::ToolFailure),
            "tool_call" => Ok(Self::ToolCall),
            "agent_spawned" => Ok(Self::AgentSpawned),
            "agent_completed" => Ok(Self::AgentCompleted),
            "heartbeat" => Ok(Self::Heartbeat),
            "summary" => Ok(Self::Summary),
            other => Err(CoreError::InvalidArgument(format!("unknown event kind: {other}"))),
        }
    }
}

/// A single row in the append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic, globally ordered identifier.
    pub id: EventId,
    /// Event kind.
    pub kind: EventKind,
    /// Free-form human-readable message.
    pub message: Option<String>,
    /// Task this event pertains to, if any.
    pub task_id: Option<TaskId>,
    /// Driver session that produced this event, if any.
    pub session_id: Option<String>,
    /// Agent that produced this event.
    pub agent_name: AgentName,
    /// Opaque structured metadata (tool name/input, etc.).
    pub metadata: Option<Value>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Whether this event falls inside an archived (`summarize`d) range.
    pub archived: bool,
}

/// Sort order for event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Filters accepted by `events list` and the brief assembler's delta query.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to a single event kind.
    pub kind: Option<EventKind>,
    /// Restrict to events attached to this task.
    pub task_id: Option<TaskId>,
    /// Restrict to events produced by this agent.
    pub agent_name: Option<AgentName>,
    /// Restrict to events from this driver session.
    pub session_id: Option<String>,
    /// Return only events with `id > since_id`.
    pub since_id: Option<EventId>,
    /// Maximum number of rows to return.
    pub limit: Option<u32>,
    /// Sort order.
    pub order: Order,
    /// Include archived (summarized-over) events. Defaults to excluding them.
    pub include_archived: bool,
}
