// vybe-store-sqlite/src/events.rs
// ============================================================================
// Module: Event Log Store
// Description: Append-only event log and per-agent cursor bookkeeping.
// Purpose: Turn vybe_core::event types into SQL against `events` and
//          `agent_cursors`.
// Dependencies: rusqlite, serde_json, vybe_core, crate::store, crate::error
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use vybe_core::AgentName;
use vybe_core::AgentState;
use vybe_core::CoreError;
use vybe_core::Event;
use vybe_core::EventFilter;
use vybe_core::EventId;
use vybe_core::EventKind;
use vybe_core::Order;
use vybe_core::TaskId;
use vybe_core::Timestamp;

use crate::error::StoreResult;
use crate::store::Store;

/// Storage operations over the append-only event log and agent cursors.
pub struct EventLog {
    store: Store,
}

impl EventLog {
    /// Builds an event log over the given connection handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends one event, returning its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    #[allow(clippy::too_many_arguments, reason = "mirrors the event's own field count")]
    pub fn append(
        &self,
        kind: EventKind,
        message: Option<String>,
        task_id: Option<&TaskId>,
        session_id: Option<&str>,
        agent_name: &AgentName,
        metadata: Option<serde_json::Value>,
        now: Timestamp,
    ) -> Result<Event, CoreError> {
        self.store
            .with_tx(|tx| {
                append_in_tx(tx, kind, message, task_id, session_id, agent_name, metadata, now)
            })
            .map_err(Into::into)
    }

    /// Lists events matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, CoreError> {
        self.store.with_tx(|tx| list_events(tx, filter)).map_err(Into::into)
    }

    /// Returns the cursor state for `agent_name`, creating a fresh one if
    /// this agent has never been seen.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn cursor(&self, agent_name: &AgentName, now: Timestamp) -> Result<AgentState, CoreError> {
        self.store
            .with_tx(|tx| {
                if let Some(state) = fetch_cursor(tx, agent_name)? {
                    return Ok(state);
                }
                let fresh = AgentState::new(agent_name.clone(), now);
                tx.execute(
                    "INSERT INTO agent_cursors
                        (agent_name, last_seen_event_id, focus_task_id, focus_project_id, \
                         updated_at)
                     VALUES (?1, ?2, NULL, NULL, ?3)",
                    params![agent_name.as_str(), fresh.last_seen_event_id.value(), now.as_millis()],
                )?;
                Ok(fresh)
            })
            .map_err(Into::into)
    }

    /// Advances `agent_name`'s cursor to `event_id`, never moving it
    /// backwards.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn advance_cursor(
        &self,
        agent_name: &AgentName,
        event_id: EventId,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_cursor(tx, agent_name)?.is_none() {
                    tx.execute(
                        "INSERT INTO agent_cursors
                            (agent_name, last_seen_event_id, focus_task_id, focus_project_id, \
                             updated_at)
                         VALUES (?1, 0, NULL, NULL, ?2)",
                        params![agent_name.as_str(), now.as_millis()],
                    )?;
                }
                tx.execute(
                    "UPDATE agent_cursors SET last_seen_event_id = MAX(last_seen_event_id, ?1), \
                     updated_at = ?2 WHERE agent_name = ?3",
                    params![event_id.value(), now.as_millis(), agent_name.as_str()],
                )?;
                Ok(())
            })
            .map_err(Into::into)
    }

    /// Sets or clears the focus task/project for `agent_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn set_focus(
        &self,
        agent_name: &AgentName,
        focus_task_id: Option<&TaskId>,
        focus_project_id: Option<&str>,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_cursor(tx, agent_name)?.is_none() {
                    tx.execute(
                        "INSERT INTO agent_cursors
                            (agent_name, last_seen_event_id, focus_task_id, focus_project_id, \
                             updated_at)
                         VALUES (?1, 0, NULL, NULL, ?2)",
                        params![agent_name.as_str(), now.as_millis()],
                    )?;
                }
                tx.execute(
                    "UPDATE agent_cursors SET focus_task_id = ?1, focus_project_id = ?2, \
                     updated_at = ?3 WHERE agent_name = ?4",
                    params![
                        focus_task_id.map(TaskId::as_str),
                        focus_project_id,
                        now.as_millis(),
                        agent_name.as_str(),
                    ],
                )?;
                Ok(())
            })
            .map_err(Into::into)
    }

    /// Returns the total number of events regardless of archived state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn count(&self) -> Result<u64, CoreError> {
        self.store
            .with_tx(|tx| {
                let count: i64 = tx.query_row("SELECT COUNT(*) FROM events", params![], |row| row.get(0))?;
                Ok(u64::try_from(count).unwrap_or(0))
            })
            .map_err(Into::into)
    }

    /// Inserts a `summary` event and archives `[from_id, through_id]`
    /// inclusive, both in one transaction, used by `events summarize`.
    ///
    /// The raw events in that range are never updated or deleted; archiving
    /// only hides them from [`EventLog::list`] by default, while the
    /// inserted summary event stands in for them in the normal event stream.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `from_id` is greater than
    /// `through_id`, or [`CoreError::Internal`] on a storage failure.
    pub fn archive_through(
        &self,
        from_id: EventId,
        through_id: EventId,
        summary: String,
        task_id: Option<&TaskId>,
        agent_name: &AgentName,
        now: Timestamp,
    ) -> Result<Event, CoreError> {
        if from_id.value() > through_id.value() {
            return Err(CoreError::InvalidArgument(format!(
                "summarize range is backwards: from {} is after through {}",
                from_id.value(),
                through_id.value()
            )));
        }
        self.store
            .with_tx(|tx| {
                let summary_event = append_in_tx(
                    tx,
                    EventKind::Summary,
                    Some(summary),
                    task_id,
                    None,
                    agent_name,
                    None,
                    now,
                )?;
                tx.execute(
                    "UPDATE events SET archived = 1 \
                     WHERE id >= ?1 AND id <= ?2 AND archived = 0",
                    params![from_id.value(), through_id.value()],
                )?;
                Ok(summary_event)
            })
            .map_err(Into::into)
    }
}

/// Appends one event using an already-open transaction.
///
/// Lets a caller that needs to commit an event alongside other writes (e.g.
/// `push`'s event-plus-artifacts, or `summarize`'s event-plus-archive) do so
/// as one atomic unit via [`crate::store::Store::with_tx`], rather than each
/// write opening and committing its own transaction.
///
/// # Errors
///
/// Returns [`crate::error::StoreError`] on a storage failure.
#[allow(clippy::too_many_arguments, reason = "mirrors the event's own field count")]
pub fn append_in_tx(
    tx: &Transaction<'_>,
    kind: EventKind,
    message: Option<String>,
    task_id: Option<&TaskId>,
    session_id: Option<&str>,
    agent_name: &AgentName,
    metadata: Option<serde_json::Value>,
    now: Timestamp,
) -> StoreResult<Event> {
    tx.execute(
        "INSERT INTO events
            (kind, message, task_id, session_id, agent_name, metadata, created_at, archived)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
        params![
            kind.as_str(),
            message,
            task_id.map(TaskId::as_str),
            session_id,
            agent_name.as_str(),
            metadata.as_ref().map(serde_json::Value::to_string),
            now.as_millis(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    fetch_event(tx, id)?
        .ok_or_else(|| crate::error::StoreError::CorruptRow("insert did not persist".to_string()))
}

fn list_events(tx: &Transaction<'_>, filter: &EventFilter) -> StoreResult<Vec<Event>> {
    let order_clause = match filter.order {
        Order::Asc => "id ASC",
        Order::Desc => "id DESC",
    };
    let sql = format!(
        "SELECT id, kind, message, task_id, session_id, agent_name, metadata, created_at, \
         archived FROM events
         WHERE (?1 IS NULL OR kind = ?1)
           AND (?2 IS NULL OR task_id = ?2)
           AND (?3 IS NULL OR agent_name = ?3)
           AND (?4 IS NULL OR session_id = ?4)
           AND (?5 IS NULL OR id > ?5)
           AND (archived = 0 OR ?6 = 1)
         ORDER BY {order_clause}
         LIMIT ?7"
    );
    let mut stmt = tx.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            filter.kind.map(EventKind::as_str),
            filter.task_id.as_ref().map(TaskId::as_str),
            filter.agent_name.as_ref().map(AgentName::as_str),
            filter.session_id.as_deref(),
            filter.since_id.map(EventId::value),
            i64::from(filter.include_archived),
            i64::from(filter.limit.unwrap_or(10_000)),
        ],
        row_to_event,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn fetch_event(tx: &Transaction<'_>, id: i64) -> StoreResult<Option<Event>> {
    tx.query_row(
        "SELECT id, kind, message, task_id, session_id, agent_name, metadata, created_at, \
         archived FROM events WHERE id = ?1",
        params![id],
        row_to_event,
    )
    .optional()
    .map_err(Into::into)
}

fn fetch_cursor(tx: &Transaction<'_>, agent_name: &AgentName) -> StoreResult<Option<AgentState>> {
    tx.query_row(
        "SELECT agent_name, last_seen_event_id, focus_task_id, focus_project_id, updated_at \
         FROM agent_cursors WHERE agent_name = ?1",
        params![agent_name.as_str()],
        row_to_agent_state,
    )
    .optional()
    .map_err(Into::into)
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    let kind: String = row.get(1)?;
    let kind = EventKind::parse(&kind)
        .map_err(|err| rusqlite::Error::InvalidColumnType(1, err.to_string(), rusqlite::types::Type::Text))?;
    let metadata: Option<String> = row.get(6)?;
    let metadata = metadata
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|err| rusqlite::Error::InvalidColumnType(6, err.to_string(), rusqlite::types::Type::Text))?;
    Ok(Event {
        id: EventId::new(row.get(0)?),
        kind,
        message: row.get(2)?,
        task_id: row.get::<_, Option<String>>(3)?.map(TaskId::new),
        session_id: row.get(4)?,
        agent_name: AgentName::new(row.get::<_, String>(5)?),
        metadata,
        created_at: Timestamp::from_millis(row.get(7)?),
        archived: row.get::<_, i64>(8)? != 0,
    })
}

fn row_to_agent_state(row: &Row<'_>) -> rusqlite::Result<AgentState> {
    Ok(AgentState {
        agent_name: AgentName::new(row.get::<_, String>(0)?),
        last_seen_event_id: EventId::new(row.get(1)?),
        focus_task_id: row.get::<_, Option<String>>(2)?.map(TaskId::new),
        focus_project_id: row.get::<_, Option<String>>(3)?.map(vybe_core::ProjectId::new),
        updated_at: Timestamp::from_millis(row.get(4)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_log() -> EventLog {
        EventLog::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn append_then_list_round_trips() {
        let log = fresh_log();
        log.append(
            EventKind::Progress,
            Some("hello".to_string()),
            None,
            None,
            &AgentName::new("agent-1"),
            None,
            Timestamp::from_millis(0),
        )
        .unwrap();
        let events = log.list(&EventFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message.as_deref(), Some("hello"));
    }

    #[test]
    fn cursor_starts_at_zero_and_only_advances_forward() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        let state = log.cursor(&agent, Timestamp::from_millis(0)).unwrap();
        assert_eq!(state.last_seen_event_id.value(), 0);
        log.advance_cursor(&agent, EventId::new(5), Timestamp::from_millis(1)).unwrap();
        log.advance_cursor(&agent, EventId::new(2), Timestamp::from_millis(2)).unwrap();
        let state = log.cursor(&agent, Timestamp::from_millis(3)).unwrap();
        assert_eq!(state.last_seen_event_id.value(), 5);
    }

    #[test]
    fn since_id_filter_excludes_seen_events() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        for i in 0..3 {
            log.append(
                EventKind::Heartbeat,
                None,
                None,
                None,
                &agent,
                None,
                Timestamp::from_millis(i),
            )
            .unwrap();
        }
        let filter = EventFilter { since_id: Some(EventId::new(1)), ..EventFilter::default() };
        let events = log.list(&filter).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn count_includes_archived_events() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        log.append(EventKind::Heartbeat, None, None, None, &agent, None, Timestamp::from_millis(0))
            .unwrap();
        log.archive_through(EventId::new(1), EventId::new(1), "done".to_string(), None, &agent, Timestamp::from_millis(1))
            .unwrap();
        // The original heartbeat plus the inserted summary event.
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn archived_events_are_excluded_unless_requested() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        log.append(EventKind::Heartbeat, None, None, None, &agent, None, Timestamp::from_millis(0))
            .unwrap();
        log.archive_through(EventId::new(1), EventId::new(1), "done".to_string(), None, &agent, Timestamp::from_millis(1))
            .unwrap();
        // The heartbeat is archived and hidden; the summary event itself is not.
        let visible = log.list(&EventFilter::default()).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, EventKind::Summary);
        let filter = EventFilter { include_archived: true, ..EventFilter::default() };
        assert_eq!(log.list(&filter).unwrap().len(), 2);
    }

    #[test]
    fn summarize_rejects_a_backwards_range() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        let err = log
            .archive_through(EventId::new(5), EventId::new(1), "done".to_string(), None, &agent, Timestamp::from_millis(0))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn summarize_inserts_a_summary_event_referencing_the_given_task() {
        let log = fresh_log();
        let agent = AgentName::new("agent-1");
        log.append(EventKind::Progress, None, None, None, &agent, None, Timestamp::from_millis(0))
            .unwrap();
        let task_id = TaskId::new("t1");
        let summary_event = log
            .archive_through(
                EventId::new(1),
                EventId::new(1),
                "wrapped up phase one".to_string(),
                Some(&task_id),
                &agent,
                Timestamp::from_millis(1),
            )
            .unwrap();
        assert_eq!(summary_event.kind, EventKind::Summary);
        assert_eq!(summary_event.message.as_deref(), Some("wrapped up phase one"));
        assert_eq!(summary_event.task_id, Some(task_id));
    }
}
