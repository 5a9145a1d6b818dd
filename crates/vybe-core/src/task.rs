// vybe-core/src/task.rs
// ============================================================================
// Module: Vybe Task Graph Types
// Description: Task entity, status machine, and deterministic ordering.
// Purpose: Provide the pure (storage-agnostic) rules the task store enforces.
// Dependencies: serde, crate::ids, crate::time, crate::error
// ============================================================================

//! ## Overview
//! This module holds the parts of the task lifecycle that do not depend on
//! SQL: the [`TaskStatus`] state machine and the deterministic ordering used
//! by `task next`, `task claim`, and resume's focus selection. The storage
//! crate is responsible for turning these pure functions into queries; it
//! must not re-derive the ordering or transition rules independently.

use serde::Deserialize;
use serde::Serialize;

use crate::error::CoreError;
use crate::ids::AgentName;
use crate::ids::ProjectId;
use crate::ids::TaskId;
use crate::time::Timestamp;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet claimed or started.
    Pending,
    /// Claimed or begun by an agent.
    InProgress,
    /// Not eligible for selection until unblocked or explicitly reopened.
    Blocked,
    /// Terminal: finished successfully (or with a recorded non-cancel outcome).
    Completed,
    /// Terminal: abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Returns whether this status is terminal (completed or cancelled).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns the stable lowercase string used in storage and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for any string other than one
    /// of the five recognized statuses.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(CoreError::InvalidArgument(format!("unknown task status: {other}"))),
        }
    }
}

/// Why a status transition was requested, used to check who may trigger it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTrigger {
    /// `task begin` or `task claim`.
    Begin,
    /// `task set-status <status>`.
    SetStatus,
    /// `task complete`.
    Complete,
    /// Automatic unblock when the last blocking dependency resolves.
    DependencyResolved,
}

/// Validates a status transition per the ledger's state machine.
///
/// Re-entering a terminal state is permitted as a no-op (the caller should
/// short-circuit and return the current row rather than mutate anything).
///
/// # Errors
///
/// Returns [`CoreError::PreconditionFailed`] for any transition not listed
/// in the state machine.
pub fn validate_transition(
    from: TaskStatus,
    to: TaskStatus,
    trigger: TransitionTrigger,
) -> Result<(), CoreError> {
    use TaskStatus::{Blocked, Cancelled, Completed, InProgress, Pending};
    use TransitionTrigger::{Begin, Complete, DependencyResolved, SetStatus};

    if from.is_terminal() && to == from {
        return Ok(());
    }

    let allowed = match (from, to, trigger) {
        (Pending, InProgress, Begin) => true,
        (Pending, Blocked, SetStatus) => true,
        (Blocked, Pending, SetStatus | DependencyResolved) => true,
        (InProgress, Completed, Complete) => true,
        (InProgress, Pending, SetStatus) => true,
        (_, Cancelled, Complete | SetStatus) if !from.is_terminal() => true,
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "cannot transition task from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

/// A task row as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque task identifier.
    pub id: TaskId,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-form description.
    pub description: Option<String>,
    /// Free-form project grouping; not a foreign key.
    pub project_id: Option<ProjectId>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Higher sorts first.
    pub priority: i64,
    /// Set on completion (e.g. `"done"`, `"cancelled"`, a short result note).
    pub outcome: Option<String>,
    /// Free-form progress summary, set by `task complete` or `task set-status`.
    pub summary: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
    /// Set iff status is completed or cancelled.
    pub completed_at: Option<Timestamp>,
    /// Owning agent, set iff status is in_progress and set via claim/begin.
    pub claimed_by: Option<AgentName>,
    /// Claim lease expiry, set iff claimed.
    pub claim_expires_at: Option<Timestamp>,
}

impl Task {
    /// Returns whether the task is eligible for `task next`/claim selection,
    /// ignoring its dependency state (callers must check deps separately).
    #[must_use]
    pub const fn is_selectable_status(&self) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// Sort key used for `task next`, `task claim` candidate selection, and
/// resume's automatic focus choice.
///
/// Sort: status in_progress before pending; then descending priority; then
/// ascending created_at; then ascending task_id. Lower tuples sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderingKey {
    status_rank: u8,
    neg_priority: i64,
    created_at_millis: i64,
    task_id: String,
}

impl OrderingKey {
    /// Builds the ordering key for a single candidate task.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        let status_rank = match task.status {
            TaskStatus::InProgress => 0,
            _ => 1,
        };
        Self {
            status_rank,
            neg_priority: -task.priority,
            created_at_millis: task.created_at.as_millis(),
            task_id: task.id.as_str().to_string(),
        }
    }
}

/// Returns the best candidate from a slice of unblocked, status-eligible
/// tasks per the ordering in §4.5, or `None` if the slice is empty.
#[must_use]
pub fn select_best<'a>(candidates: &'a [Task]) -> Option<&'a Task> {
    candidates.iter().min_by_key(|task| OrderingKey::for_task(task))
}

#[cfg(test)]
mod tests {
    use super::TaskStatus::{Blocked, Cancelled, Completed, InProgress, Pending};
    use super::TransitionTrigger::{Begin, Complete, DependencyResolved, SetStatus};
    use super::*;

    fn task(id: &str, status: TaskStatus, priority: i64, created_at_millis: i64) -> Task {
        Task {
            id: TaskId::new(id),
            title: id.to_string(),
            description: None,
            project_id: None,
            status,
            priority,
            outcome: None,
            summary: None,
            created_at: Timestamp::from_millis(created_at_millis),
            updated_at: Timestamp::from_millis(created_at_millis),
            completed_at: None,
            claimed_by: None,
            claim_expires_at: None,
        }
    }

    #[test]
    fn pending_to_in_progress_via_begin_is_allowed() {
        assert!(validate_transition(Pending, InProgress, Begin).is_ok());
    }

    #[test]
    fn pending_to_completed_via_begin_is_rejected() {
        assert!(validate_transition(Pending, Completed, Begin).is_err());
    }

    #[test]
    fn in_progress_to_completed_requires_complete_trigger() {
        assert!(validate_transition(InProgress, Completed, Complete).is_ok());
        assert!(validate_transition(InProgress, Completed, SetStatus).is_err());
    }

    #[test]
    fn blocked_unblocks_via_dependency_resolved() {
        assert!(validate_transition(Blocked, Pending, DependencyResolved).is_ok());
    }

    #[test]
    fn terminal_states_reject_any_forward_transition() {
        assert!(validate_transition(Completed, Pending, SetStatus).is_err());
        assert!(validate_transition(Cancelled, InProgress, Begin).is_err());
    }

    #[test]
    fn re_entering_the_same_terminal_state_is_a_no_op() {
        assert!(validate_transition(Completed, Completed, SetStatus).is_ok());
        assert!(validate_transition(Cancelled, Cancelled, Complete).is_ok());
    }

    #[test]
    fn cancel_is_allowed_from_any_non_terminal_state() {
        assert!(validate_transition(Pending, Cancelled, SetStatus).is_ok());
        assert!(validate_transition(InProgress, Cancelled, Complete).is_ok());
        assert!(validate_transition(Blocked, Cancelled, SetStatus).is_ok());
    }

    #[test]
    fn ordering_prefers_in_progress_over_pending() {
        let tasks = [task("a", Pending, 0, 0), task("b", InProgress, 0, 0)];
        assert_eq!(select_best(&tasks).unwrap().id.as_str(), "b");
    }

    #[test]
    fn ordering_prefers_higher_priority() {
        let tasks = [task("a", Pending, 1, 0), task("b", Pending, 5, 0)];
        assert_eq!(select_best(&tasks).unwrap().id.as_str(), "b");
    }

    #[test]
    fn ordering_prefers_earlier_created_at_on_priority_tie() {
        let tasks = [task("a", Pending, 1, 100), task("b", Pending, 1, 50)];
        assert_eq!(select_best(&tasks).unwrap().id.as_str(), "b");
    }

    #[test]
    fn ordering_breaks_final_tie_on_task_id() {
        let tasks = [task("zzz", Pending, 1, 0), task("aaa", Pending, 1, 0)];
        assert_eq!(select_best(&tasks).unwrap().id.as_str(), "aaa");
    }

    #[test]
    fn select_best_on_empty_slice_is_none() {
        let tasks: [Task; 0] = [];
        assert!(select_best(&tasks).is_none());
    }
}
