// vybe-store-sqlite/src/brief.rs
// ============================================================================
// Module: Resume Brief Assembler
// Description: Gathers focus task, event deltas, memory, and artifacts into
//              a vybe_core::Brief.
// Purpose: The single entry point behind `resume` and `resume --peek`.
// Dependencies: vybe_core, crate::tasks, crate::events, crate::memory,
//               crate::artifacts
// ============================================================================

use vybe_core::AgentName;
use vybe_core::Brief;
use vybe_core::CoreError;
use vybe_core::EventFilter;
use vybe_core::Order;
use vybe_core::ProjectId;
use vybe_core::Task;
use vybe_core::TaskId;
use vybe_core::Timestamp;
use vybe_core::render_additional_context;
use vybe_core::select_best;

use crate::artifacts::ArtifactIndex;
use crate::events::EventLog;
use crate::memory::MemoryStore;
use crate::store::Store;
use crate::tasks::TaskStore;

/// Assembles resume briefs from the component stores.
pub struct BriefAssembler {
    tasks: TaskStore,
    events: EventLog,
    memory: MemoryStore,
    artifacts: ArtifactIndex,
}

impl BriefAssembler {
    /// Builds a brief assembler over the given connection handle.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            tasks: TaskStore::new(store.clone()),
            events: EventLog::new(store.clone()),
            memory: MemoryStore::new(store.clone()),
            artifacts: ArtifactIndex::new(store),
        }
    }

    /// Assembles a brief for `agent_name`.
    ///
    /// If `peek` is `false`, the agent's cursor is advanced to the newest
    /// returned event as part of assembly. If the agent has no focus task
    /// already recorded, one is auto-selected (and persisted, unless
    /// `peek`) the same way `task next` would choose one, scoped to the
    /// agent's current focus project if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn assemble(
        &self,
        agent_name: &AgentName,
        peek: bool,
        now: Timestamp,
    ) -> Result<Brief, CoreError> {
        let cursor = self.events.cursor(agent_name, now)?;

        let pinned = match &cursor.focus_task_id {
            Some(task_id) => Some(self.tasks.get(task_id)?),
            None => None,
        };
        // A pin surviving a completed/cancelled task is stale: a terminal
        // task is never a valid focus, so fall through to auto-selection
        // and clear the pin rather than resuming onto finished work.
        let pin_is_stale = pinned.as_ref().is_some_and(|task| task.status.is_terminal());
        if pin_is_stale && !peek {
            self.events.set_focus(agent_name, None, None, now)?;
        }

        let had_pin = cursor.focus_task_id.is_some() && !pin_is_stale;
        let focus_task = match (pin_is_stale, pinned) {
            (false, Some(task)) => Some(task),
            _ => self.auto_select_focus(cursor.focus_project_id.as_ref())?,
        };

        if !peek
            && focus_task.is_some()
            && !had_pin
            && let Some(task) = &focus_task
        {
            self.events.set_focus(agent_name, Some(&task.id), None, now)?;
        }

        let filter = EventFilter {
            since_id: Some(cursor.last_seen_event_id),
            order: Order::Asc,
            ..EventFilter::default()
        };
        let events_since_cursor = self.events.list(&filter)?;

        let project_scope_id = focus_task.as_ref().and_then(|task| task.project_id.as_ref());
        let task_scope_id = focus_task.as_ref().map(|task| task.id.as_str());
        let relevant_memory = self.memory.query(
            None,
            project_scope_id.map(ProjectId::as_str),
            task_scope_id,
            now,
        )?;

        let linked_artifacts = match &focus_task {
            Some(task) => self.artifacts.list_for_task(&task.id)?,
            None => Vec::new(),
        };

        let additional_context = render_additional_context(
            focus_task.as_ref(),
            &events_since_cursor,
            &relevant_memory,
            &linked_artifacts,
        );

        let advanced_to_event_id = events_since_cursor.last().map(|event| event.id.value());
        if !peek
            && let Some(event_id) = events_since_cursor.last().map(|event| event.id)
        {
            self.events.advance_cursor(agent_name, event_id, now)?;
        }

        Ok(Brief {
            focus_task,
            events_since_cursor,
            relevant_memory,
            linked_artifacts,
            additional_context,
            advanced_to_event_id: if peek { None } else { advanced_to_event_id },
        })
    }

    fn auto_select_focus(&self, project_id: Option<&ProjectId>) -> Result<Option<Task>, CoreError> {
        let candidates = self.tasks.list(None, project_id)?;
        let eligible: Vec<Task> = candidates.into_iter().filter(Task::is_selectable_status).collect();
        Ok(select_best(&eligible).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_auto_selects_a_focus_task_when_none_is_pinned() {
        let store = Store::open_in_memory().unwrap();
        let tasks = TaskStore::new(store.clone());
        tasks
            .create(TaskId::new("t1"), "Ship it".to_string(), None, None, 0, &[], Timestamp::from_millis(0))
            .unwrap();
        let assembler = BriefAssembler::new(store);
        let brief =
            assembler.assemble(&AgentName::new("agent-1"), false, Timestamp::from_millis(1)).unwrap();
        assert_eq!(brief.focus_task.unwrap().id, TaskId::new("t1"));
        assert!(brief.additional_context.contains("Ship it"));
    }

    #[test]
    fn peek_does_not_advance_the_cursor() {
        let store = Store::open_in_memory().unwrap();
        let events = EventLog::new(store.clone());
        let agent = AgentName::new("agent-1");
        events
            .append(
                vybe_core::EventKind::Heartbeat,
                None,
                None,
                None,
                &agent,
                None,
                Timestamp::from_millis(0),
            )
            .unwrap();
        let assembler = BriefAssembler::new(store.clone());
        assembler.assemble(&agent, true, Timestamp::from_millis(1)).unwrap();
        let cursor = events.cursor(&agent, Timestamp::from_millis(2)).unwrap();
        assert_eq!(cursor.last_seen_event_id.value(), 0);
    }

    #[test]
    fn resume_advances_the_cursor_past_delivered_events() {
        let store = Store::open_in_memory().unwrap();
        let events = EventLog::new(store.clone());
        let agent = AgentName::new("agent-1");
        events
            .append(
                vybe_core::EventKind::Heartbeat,
                None,
                None,
                None,
                &agent,
                None,
                Timestamp::from_millis(0),
            )
            .unwrap();
        let assembler = BriefAssembler::new(store.clone());
        assembler.assemble(&agent, false, Timestamp::from_millis(1)).unwrap();
        let cursor = events.cursor(&agent, Timestamp::from_millis(2)).unwrap();
        assert_eq!(cursor.last_seen_event_id.value(), 1);
    }

    #[test]
    fn a_pinned_focus_task_is_preferred_over_auto_selection() {
        let store = Store::open_in_memory().unwrap();
        let tasks = TaskStore::new(store.clone());
        tasks
            .create(TaskId::new("a"), "A".to_string(), None, None, 10, &[], Timestamp::from_millis(0))
            .unwrap();
        tasks
            .create(TaskId::new("b"), "B".to_string(), None, None, 0, &[], Timestamp::from_millis(0))
            .unwrap();
        let events = EventLog::new(store.clone());
        let agent = AgentName::new("agent-1");
        events.set_focus(&agent, Some(&TaskId::new("b")), None, Timestamp::from_millis(0)).unwrap();
        let assembler = BriefAssembler::new(store);
        let brief = assembler.assemble(&agent, true, Timestamp::from_millis(1)).unwrap();
        assert_eq!(brief.focus_task.unwrap().id, TaskId::new("b"));
    }

    #[test]
    fn a_pin_on_a_completed_task_falls_through_to_auto_selection_and_is_cleared() {
        let store = Store::open_in_memory().unwrap();
        let tasks = TaskStore::new(store.clone());
        tasks
            .create(TaskId::new("done"), "Done".to_string(), None, None, 10, &[], Timestamp::from_millis(0))
            .unwrap();
        tasks
            .create(TaskId::new("next"), "Next".to_string(), None, None, 0, &[], Timestamp::from_millis(0))
            .unwrap();
        let events = EventLog::new(store.clone());
        let agent = AgentName::new("agent-1");
        events.set_focus(&agent, Some(&TaskId::new("done")), None, Timestamp::from_millis(0)).unwrap();
        tasks
            .set_status(
                &TaskId::new("done"),
                vybe_core::TaskStatus::Completed,
                vybe_core::TransitionTrigger::Complete,
                None,
                None,
                None,
                Timestamp::from_millis(1),
            )
            .unwrap();

        let assembler = BriefAssembler::new(store.clone());
        let brief = assembler.assemble(&agent, false, Timestamp::from_millis(2)).unwrap();
        assert_eq!(brief.focus_task.unwrap().id, TaskId::new("next"));

        let cursor = events.cursor(&agent, Timestamp::from_millis(3)).unwrap();
        assert_eq!(cursor.focus_task_id, Some(TaskId::new("next")));
    }
}
