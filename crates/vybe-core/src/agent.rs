// vybe-core/src/agent.rs
// ============================================================================
// Module: Vybe Agent Cursor
// Description: Per-agent cursor and focus state.
// Purpose: Hold the high-water mark of observed events and the agent's
//          manually- or automatically-selected focus task.
// Dependencies: serde, crate::ids, crate::time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AgentName;
use crate::ids::EventId;
use crate::ids::ProjectId;
use crate::ids::TaskId;
use crate::time::Timestamp;

/// Per-agent cursor and focus state, created lazily on first reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Agent name (identity).
    pub agent_name: AgentName,
    /// Highest event ID returned to this agent so far.
    pub last_seen_event_id: EventId,
    /// Manually- or automatically-selected focus task, if any.
    pub focus_task_id: Option<TaskId>,
    /// Project scoped alongside the focus task, if any.
    pub focus_project_id: Option<ProjectId>,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl AgentState {
    /// Builds a fresh cursor for an agent with no prior history.
    #[must_use]
    pub fn new(agent_name: AgentName, now: Timestamp) -> Self {
        Self {
            agent_name,
            last_seen_event_id: EventId::new(0),
            focus_task_id: None,
            focus_project_id: None,
            updated_at: now,
        }
    }
}
