// vybe-store-sqlite/src/tasks.rs
// ============================================================================
// Module: Task Graph Store
// Description: CRUD, dependency edges, claim leases, and selection queries.
// Purpose: Turn the pure rules in vybe_core::task into SQL against `tasks`
//          and `task_dependencies`.
// Dependencies: rusqlite, vybe_core, crate::store, crate::error
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use vybe_core::AgentName;
use vybe_core::CoreError;
use vybe_core::ProjectId;
use vybe_core::Task;
use vybe_core::TaskId;
use vybe_core::TaskStatus;
use vybe_core::Timestamp;
use vybe_core::TransitionTrigger;
use vybe_core::select_best;
use vybe_core::validate_transition;

use crate::error::StoreError;
use crate::error::StoreResult;
use crate::store::Store;

/// Maximum dependency depth walked when checking a new edge for a cycle.
/// The graph is expected to stay shallow; a limit here turns a pathological
/// input into a clear error instead of an unbounded scan.
const MAX_DEPENDENCY_DEPTH: usize = 1_000;

/// Default claim lease duration, renewed by `task heartbeat`.
pub const DEFAULT_CLAIM_LEASE_MILLIS: i64 = 15 * 60 * 1000;

/// Aggregate counts returned by `task stats`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TaskStats {
    /// Total tasks regardless of status.
    pub total: i64,
    /// Tasks in `pending`.
    pub pending: i64,
    /// Tasks in `in_progress`.
    pub in_progress: i64,
    /// Tasks in `blocked`.
    pub blocked: i64,
    /// Tasks in `completed`.
    pub completed: i64,
    /// Tasks in `cancelled`.
    pub cancelled: i64,
}

/// Storage operations over the task graph.
pub struct TaskStore {
    store: Store,
}

impl TaskStore {
    /// Builds a task store over the given connection handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates a task, optionally depending on existing tasks.
    ///
    /// A task created with at least one unresolved dependency starts
    /// `blocked`; otherwise it starts `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `id` already exists, any
    /// `depends_on` task does not exist, or adding the edges would create a
    /// cycle.
    pub fn create(
        &self,
        id: TaskId,
        title: String,
        description: Option<String>,
        project_id: Option<ProjectId>,
        priority: i64,
        depends_on: &[TaskId],
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                if task_exists(tx, id.as_str())? {
                    return Err(StoreError::CorruptRow(format!(
                        "task already exists: {}",
                        id.as_str()
                    )));
                }
                for dep in depends_on {
                    if !task_exists(tx, dep.as_str())? {
                        return Err(StoreError::CorruptRow(format!(
                            "dependency does not exist: {}",
                            dep.as_str()
                        )));
                    }
                }
                let unresolved = any_unresolved(tx, depends_on)?;
                let status = if unresolved { TaskStatus::Blocked } else { TaskStatus::Pending };
                tx.execute(
                    "INSERT INTO tasks
                        (id, title, description, project_id, status, priority,
                         outcome, summary, created_at, updated_at, completed_at,
                         claimed_by, claim_expires_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7, ?7, NULL, NULL, NULL)",
                    params![
                        id.as_str(),
                        title,
                        description,
                        project_id.as_ref().map(ProjectId::as_str),
                        status.as_str(),
                        priority,
                        now.as_millis(),
                    ],
                )?;
                for dep in depends_on {
                    tx.execute(
                        "INSERT INTO task_dependencies (task_id, depends_on_task_id) \
                         VALUES (?1, ?2)",
                        params![id.as_str(), dep.as_str()],
                    )?;
                }
                fetch_task(tx, id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("insert did not persist".to_string()))
            })
            .map_err(Into::into)
    }

    /// Fetches a single task by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no task has `id`.
    pub fn get(&self, id: &TaskId) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                fetch_task(tx, id.as_str())?.ok_or_else(|| {
                    StoreError::CorruptRow(format!("not_found:task {}", id.as_str()))
                })
            })
            .map_err(map_not_found)
    }

    /// Deletes a task and its dependency edges.
    ///
    /// Does not cascade to artifacts or events linked to this task; those
    /// remain addressable by ID with `task_id` pointing at an identifier
    /// that no longer resolves.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no task has `id`.
    pub fn delete(&self, id: &TaskId) -> Result<(), CoreError> {
        self.store
            .with_tx(|tx| {
                if !task_exists(tx, id.as_str())? {
                    return Err(StoreError::CorruptRow(format!("not_found:task {}", id.as_str())));
                }
                tx.execute(
                    "DELETE FROM task_dependencies WHERE task_id = ?1 OR depends_on_task_id = ?1",
                    params![id.as_str()],
                )?;
                tx.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
                Ok(())
            })
            .map_err(map_not_found)
    }

    /// Lists all tasks, optionally filtered by status and/or project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn list(
        &self,
        status: Option<TaskStatus>,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<Task>, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut stmt = tx.prepare(
                    "SELECT id, title, description, project_id, status, priority, outcome, \
                     summary, created_at, updated_at, completed_at, claimed_by, \
                     claim_expires_at FROM tasks
                     WHERE (?1 IS NULL OR status = ?1)
                       AND (?2 IS NULL OR project_id = ?2)
                     ORDER BY created_at ASC, id ASC",
                )?;
                let rows = stmt.query_map(
                    params![status.map(TaskStatus::as_str), project_id.map(ProjectId::as_str)],
                    row_to_task,
                )?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .map_err(Into::into)
    }

    /// Adds a dependency edge from `task_id` on `depends_on`, re-blocking
    /// `task_id` if it was pending.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if either task is missing, or
    /// [`CoreError::InvalidArgument`] if the edge would create a cycle.
    pub fn add_dependency(
        &self,
        task_id: &TaskId,
        depends_on: &TaskId,
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_task(tx, task_id.as_str())?.is_none() {
                    return Err(StoreError::CorruptRow(format!(
                        "not_found:task {}",
                        task_id.as_str()
                    )));
                }
                if fetch_task(tx, depends_on.as_str())?.is_none() {
                    return Err(StoreError::CorruptRow(format!(
                        "not_found:task {}",
                        depends_on.as_str()
                    )));
                }
                if task_id == depends_on || reaches(tx, depends_on.as_str(), task_id.as_str())? {
                    return Err(StoreError::CorruptRow(format!(
                        "invalid:cycle detected adding dependency {} -> {}",
                        task_id.as_str(),
                        depends_on.as_str()
                    )));
                }
                tx.execute(
                    "INSERT OR IGNORE INTO task_dependencies (task_id, depends_on_task_id) \
                     VALUES (?1, ?2)",
                    params![task_id.as_str(), depends_on.as_str()],
                )?;
                let unresolved = any_unresolved(tx, std::slice::from_ref(depends_on))?;
                if unresolved {
                    tx.execute(
                        "UPDATE tasks SET status = ?1, updated_at = ?2 \
                         WHERE id = ?3 AND status = 'pending'",
                        params![TaskStatus::Blocked.as_str(), now.as_millis(), task_id.as_str()],
                    )?;
                }
                fetch_task(tx, task_id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("update did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Transitions a task's status, validating the transition and cascading
    /// unblocks to dependents when a task completes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the task does not exist, or
    /// [`CoreError::PreconditionFailed`] if the transition is not allowed.
    pub fn set_status(
        &self,
        id: &TaskId,
        to: TaskStatus,
        trigger: TransitionTrigger,
        outcome: Option<String>,
        summary: Option<String>,
        claimed_by: Option<&AgentName>,
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                let Some(task) = fetch_task(tx, id.as_str())? else {
                    return Err(StoreError::CorruptRow(format!("not_found:task {}", id.as_str())));
                };
                validate_transition(task.status, to, trigger)
                    .map_err(|err| StoreError::CorruptRow(err.to_string()))?;
                if task.status.is_terminal() && to == task.status {
                    return Ok(task);
                }

                let completed_at =
                    if to.is_terminal() { Some(now.as_millis()) } else { None };
                let claim_fields_cleared = to.is_terminal() || to == TaskStatus::Pending;
                tx.execute(
                    "UPDATE tasks SET status = ?1, outcome = COALESCE(?2, outcome), \
                     summary = COALESCE(?3, summary), completed_at = ?4, updated_at = ?5, \
                     claimed_by = CASE WHEN ?6 THEN NULL ELSE COALESCE(?7, claimed_by) END, \
                     claim_expires_at = CASE WHEN ?6 THEN NULL ELSE claim_expires_at END \
                     WHERE id = ?8",
                    params![
                        to.as_str(),
                        outcome,
                        summary,
                        completed_at,
                        now.as_millis(),
                        claim_fields_cleared,
                        claimed_by.map(AgentName::as_str),
                        id.as_str(),
                    ],
                )?;

                if to == TaskStatus::Completed {
                    unblock_dependents(tx, id.as_str(), now)?;
                }

                fetch_task(tx, id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("update did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Sets a task's priority.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the task does not exist.
    pub fn set_priority(&self, id: &TaskId, priority: i64, now: Timestamp) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_task(tx, id.as_str())?.is_none() {
                    return Err(StoreError::CorruptRow(format!("not_found:task {}", id.as_str())));
                }
                tx.execute(
                    "UPDATE tasks SET priority = ?1, updated_at = ?2 WHERE id = ?3",
                    params![priority, now.as_millis(), id.as_str()],
                )?;
                fetch_task(tx, id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("update did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Removes a dependency edge, re-checking whether the dependent task can
    /// now unblock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `task_id` does not exist.
    pub fn remove_dependency(
        &self,
        task_id: &TaskId,
        depends_on: &TaskId,
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_task(tx, task_id.as_str())?.is_none() {
                    return Err(StoreError::CorruptRow(format!(
                        "not_found:task {}",
                        task_id.as_str()
                    )));
                }
                tx.execute(
                    "DELETE FROM task_dependencies WHERE task_id = ?1 AND depends_on_task_id = ?2",
                    params![task_id.as_str(), depends_on.as_str()],
                )?;
                let still_blocked = any_unresolved_except(tx, task_id, "")?;
                if !still_blocked {
                    tx.execute(
                        "UPDATE tasks SET status = 'pending', updated_at = ?1 \
                         WHERE id = ?2 AND status = 'blocked'",
                        params![now.as_millis(), task_id.as_str()],
                    )?;
                }
                fetch_task(tx, task_id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("update did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Returns the best pending-or-in-progress, unblocked candidate without
    /// mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn next(&self, project_id: Option<&ProjectId>) -> Result<Option<Task>, CoreError> {
        self.store
            .with_tx(|tx| {
                let candidates = selectable_candidates(tx, project_id)?;
                Ok(select_best(&candidates).cloned())
            })
            .map_err(Into::into)
    }

    /// Atomically selects and claims the best candidate for `agent_name`,
    /// setting it `in_progress` with a fresh claim lease.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no eligible task exists.
    pub fn claim(
        &self,
        agent_name: &AgentName,
        project_id: Option<&ProjectId>,
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                let candidates = selectable_candidates(tx, project_id)?;
                let chosen = select_best(&candidates).cloned().ok_or_else(|| {
                    StoreError::CorruptRow("not_found:no eligible task".to_string())
                })?;
                let lease_expires = now.plus_millis(DEFAULT_CLAIM_LEASE_MILLIS);
                tx.execute(
                    "UPDATE tasks SET status = 'in_progress', claimed_by = ?1, \
                     claim_expires_at = ?2, updated_at = ?3 WHERE id = ?4",
                    params![
                        agent_name.as_str(),
                        lease_expires.as_millis(),
                        now.as_millis(),
                        chosen.id.as_str(),
                    ],
                )?;
                fetch_task(tx, chosen.id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("claim did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Renews the claim lease on a task the caller still owns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PreconditionFailed`] if the task is not claimed
    /// by `agent_name`.
    pub fn heartbeat(
        &self,
        id: &TaskId,
        agent_name: &AgentName,
        now: Timestamp,
    ) -> Result<Task, CoreError> {
        self.store
            .with_tx(|tx| {
                let Some(task) = fetch_task(tx, id.as_str())? else {
                    return Err(StoreError::CorruptRow(format!("not_found:task {}", id.as_str())));
                };
                if task.claimed_by.as_ref() != Some(agent_name) {
                    return Err(StoreError::CorruptRow(format!(
                        "invalid:task {} is not claimed by {}",
                        id.as_str(),
                        agent_name.as_str()
                    )));
                }
                let lease_expires = now.plus_millis(DEFAULT_CLAIM_LEASE_MILLIS);
                tx.execute(
                    "UPDATE tasks SET claim_expires_at = ?1, updated_at = ?2 WHERE id = ?3",
                    params![lease_expires.as_millis(), now.as_millis(), id.as_str()],
                )?;
                fetch_task(tx, id.as_str())?
                    .ok_or_else(|| StoreError::CorruptRow("update did not persist".to_string()))
            })
            .map_err(map_core_error)
    }

    /// Reclaims expired leases, returning claimed tasks to `pending`, and
    /// returns the IDs of every task released.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn reclaim_expired_leases(&self, now: Timestamp) -> Result<Vec<TaskId>, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut stmt = tx.prepare(
                    "UPDATE tasks SET status = 'pending', claimed_by = NULL, \
                     claim_expires_at = NULL, updated_at = ?1
                     WHERE status = 'in_progress' AND claim_expires_at IS NOT NULL \
                       AND claim_expires_at < ?1
                     RETURNING id",
                )?;
                let released = stmt
                    .query_map(params![now.as_millis()], |row| row.get::<_, String>(0))?
                    .map(|id| id.map(TaskId::new))
                    .collect::<Result<Vec<_>, _>>()?;
                if !released.is_empty() {
                    tracing::warn!(count = released.len(), "reclaimed expired task claim leases");
                }
                Ok(released)
            })
            .map_err(Into::into)
    }

    /// Returns the tasks directly unblocked by completing `id` (i.e. tasks
    /// whose only remaining blocking dependency is `id`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` does not exist.
    pub fn unlocks(&self, id: &TaskId) -> Result<Vec<Task>, CoreError> {
        self.store
            .with_tx(|tx| {
                if fetch_task(tx, id.as_str())?.is_none() {
                    return Err(StoreError::CorruptRow(format!("not_found:task {}", id.as_str())));
                }
                let mut stmt = tx.prepare(
                    "SELECT t.id, t.title, t.description, t.project_id, t.status, t.priority, \
                     t.outcome, t.summary, t.created_at, t.updated_at, t.completed_at, \
                     t.claimed_by, t.claim_expires_at
                     FROM tasks t
                     JOIN task_dependencies d ON d.task_id = t.id
                     WHERE d.depends_on_task_id = ?1 AND t.status = 'blocked'",
                )?;
                let rows = stmt.query_map(params![id.as_str()], row_to_task)?;
                let mut out = Vec::new();
                for row in rows {
                    let task = row?;
                    if !any_unresolved_except(tx, &task.id, id.as_str())? {
                        out.push(task);
                    }
                }
                Ok(out)
            })
            .map_err(Into::into)
    }

    /// Returns aggregate status counts across all tasks.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn stats(&self) -> Result<TaskStats, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut stats = TaskStats::default();
                let mut stmt = tx.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
                let rows = stmt.query_map(params![], |row| {
                    let status: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((status, count))
                })?;
                for row in rows {
                    let (status, count) = row?;
                    stats.total += count;
                    match status.as_str() {
                        "pending" => stats.pending = count,
                        "in_progress" => stats.in_progress = count,
                        "blocked" => stats.blocked = count,
                        "completed" => stats.completed = count,
                        "cancelled" => stats.cancelled = count,
                        _ => {}
                    }
                }
                Ok(stats)
            })
            .map_err(Into::into)
    }
}

fn map_core_error(err: StoreError) -> CoreError {
    if let StoreError::CorruptRow(msg) = &err {
        if let Some(rest) = msg.strip_prefix("not_found:") {
            return CoreError::NotFound(rest.to_string());
        }
        if let Some(rest) = msg.strip_prefix("invalid:") {
            return CoreError::InvalidArgument(rest.to_string());
        }
    }
    err.into()
}

fn map_not_found(err: StoreError) -> CoreError {
    map_core_error(err)
}

fn task_exists(tx: &Transaction<'_>, id: &str) -> StoreResult<bool> {
    Ok(tx
        .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Walks dependency edges starting at `from`, returning whether `to` is
/// reachable. Used both to check "is this dependency unresolved" (by status)
/// and to check "would this edge create a cycle" (by reachability).
fn reaches(tx: &Transaction<'_>, from: &str, to: &str) -> StoreResult<bool> {
    let mut frontier = vec![from.to_string()];
    let mut visited = std::collections::HashSet::new();
    let mut steps = 0usize;
    while let Some(current) = frontier.pop() {
        if current == to {
            return Ok(true);
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        steps += 1;
        if steps > MAX_DEPENDENCY_DEPTH {
            return Err(StoreError::CorruptRow(
                "invalid:dependency graph exceeds maximum traversal depth".to_string(),
            ));
        }
        let mut stmt =
            tx.prepare_cached("SELECT depends_on_task_id FROM task_dependencies WHERE task_id = ?1")?;
        let rows = stmt.query_map(params![current], |row| row.get::<_, String>(0))?;
        for row in rows {
            frontier.push(row?);
        }
    }
    Ok(false)
}

fn any_unresolved(tx: &Transaction<'_>, depends_on: &[TaskId]) -> StoreResult<bool> {
    for dep in depends_on {
        let status: String =
            tx.query_row("SELECT status FROM tasks WHERE id = ?1", params![dep.as_str()], |row| {
                row.get(0)
            })?;
        if status != TaskStatus::Completed.as_str() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn any_unresolved_except(tx: &Transaction<'_>, task_id: &TaskId, except: &str) -> StoreResult<bool> {
    let mut stmt = tx.prepare_cached(
        "SELECT d.depends_on_task_id, t.status FROM task_dependencies d
         JOIN tasks t ON t.id = d.depends_on_task_id
         WHERE d.task_id = ?1",
    )?;
    let rows = stmt.query_map(params![task_id.as_str()], |row| {
        let dep_id: String = row.get(0)?;
        let status: String = row.get(1)?;
        Ok((dep_id, status))
    })?;
    for row in rows {
        let (dep_id, status) = row?;
        if dep_id == except {
            continue;
        }
        if status != TaskStatus::Completed.as_str() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn unblock_dependents(tx: &Transaction<'_>, completed_id: &str, now: Timestamp) -> StoreResult<()> {
    let mut stmt = tx.prepare_cached(
        "SELECT task_id FROM task_dependencies WHERE depends_on_task_id = ?1",
    )?;
    let dependent_ids: Vec<String> =
        stmt.query_map(params![completed_id], |row| row.get(0))?.collect::<Result<_, _>>()?;
    for dependent_id in dependent_ids {
        let still_blocked = any_unresolved_except(
            tx,
            &TaskId::new(dependent_id.clone()),
            completed_id,
        )?;
        if !still_blocked {
            tx.execute(
                "UPDATE tasks SET status = 'pending', updated_at = ?1 \
                 WHERE id = ?2 AND status = 'blocked'",
                params![now.as_millis(), dependent_id],
            )?;
        }
    }
    Ok(())
}

fn selectable_candidates(tx: &Transaction<'_>, project_id: Option<&ProjectId>) -> StoreResult<Vec<Task>> {
    let mut stmt = tx.prepare(
        "SELECT id, title, description, project_id, status, priority, outcome, summary, \
         created_at, updated_at, completed_at, claimed_by, claim_expires_at FROM tasks
         WHERE status IN ('pending', 'in_progress')
           AND (?1 IS NULL OR project_id = ?1)",
    )?;
    let rows = stmt.query_map(params![project_id.map(ProjectId::as_str)], row_to_task)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn fetch_task(tx: &Transaction<'_>, id: &str) -> StoreResult<Option<Task>> {
    tx.query_row(
        "SELECT id, title, description, project_id, status, priority, outcome, summary, \
         created_at, updated_at, completed_at, claimed_by, claim_expires_at \
         FROM tasks WHERE id = ?1",
        params![id],
        row_to_task,
    )
    .optional()
    .map_err(Into::into)
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let status = TaskStatus::parse(&status)
        .map_err(|err| rusqlite::Error::InvalidColumnType(4, err.to_string(), rusqlite::types::Type::Text))?;
    Ok(Task {
        id: TaskId::new(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        project_id: row.get::<_, Option<String>>(3)?.map(ProjectId::new),
        status,
        priority: row.get(5)?,
        outcome: row.get(6)?,
        summary: row.get(7)?,
        created_at: Timestamp::from_millis(row.get(8)?),
        updated_at: Timestamp::from_millis(row.get(9)?),
        completed_at: row.get::<_, Option<i64>>(10)?.map(Timestamp::from_millis),
        claimed_by: row.get::<_, Option<String>>(11)?.map(AgentName::new),
        claim_expires_at: row.get::<_, Option<i64>>(12)?.map(Timestamp::from_millis),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_store() -> TaskStore {
        TaskStore::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn create_with_no_dependencies_starts_pending() {
        let store = fresh_store();
        let task =
            store.create(TaskId::new("t1"), "Title".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn delete_removes_the_task_and_its_dependency_edges() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        store
            .create(TaskId::new("b"), "B".to_string(), None, None, 0, &[TaskId::new("a")], Timestamp::from_millis(0))
            .unwrap();
        store.delete(&TaskId::new("a")).unwrap();
        assert!(store.get(&TaskId::new("a")).is_err());
        let edges: i64 = store
            .store
            .with_tx(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM task_dependencies", params![], |row| row.get(0))?))
            .unwrap();
        assert_eq!(edges, 0);
    }

    #[test]
    fn delete_fails_for_an_unknown_task() {
        let store = fresh_store();
        assert!(store.delete(&TaskId::new("missing")).is_err());
    }

    #[test]
    fn create_with_unresolved_dependency_starts_blocked() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        let b = store
            .create(
                TaskId::new("b"),
                "B".to_string(),
                None,
                None,
                0,
                &[TaskId::new("a")],
                Timestamp::from_millis(0),
            )
            .unwrap();
        assert_eq!(b.status, TaskStatus::Blocked);
    }

    #[test]
    fn completing_a_dependency_unblocks_its_dependent() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        store
            .create(
                TaskId::new("b"),
                "B".to_string(),
                None,
                None,
                0,
                &[TaskId::new("a")],
                Timestamp::from_millis(0),
            )
            .unwrap();
        store
            .set_status(
                &TaskId::new("a"),
                TaskStatus::InProgress,
                TransitionTrigger::Begin,
                None,
                None,
                None,
                Timestamp::from_millis(1),
            )
            .unwrap();
        store
            .set_status(
                &TaskId::new("a"),
                TaskStatus::Completed,
                TransitionTrigger::Complete,
                None,
                None,
                None,
                Timestamp::from_millis(2),
            )
            .unwrap();
        let b = store.get(&TaskId::new("b")).unwrap();
        assert_eq!(b.status, TaskStatus::Pending);
    }

    #[test]
    fn adding_a_dependency_that_would_cycle_is_rejected() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        store
            .create(
                TaskId::new("b"),
                "B".to_string(),
                None,
                None,
                0,
                &[TaskId::new("a")],
                Timestamp::from_millis(0),
            )
            .unwrap();
        let result = store.add_dependency(&TaskId::new("a"), &TaskId::new("b"), Timestamp::from_millis(1));
        assert!(result.is_err());
    }

    #[test]
    fn claim_sets_in_progress_and_lease() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        let claimed = store.claim(&AgentName::new("agent-1"), None, Timestamp::from_millis(0)).unwrap();
        assert_eq!(claimed.status, TaskStatus::InProgress);
        assert_eq!(claimed.claimed_by, Some(AgentName::new("agent-1")));
        assert!(claimed.claim_expires_at.is_some());
    }

    #[test]
    fn expired_leases_are_reclaimed_to_pending() {
        let store = fresh_store();
        store.create(TaskId::new("a"), "A".to_string(), None, None, 0, &[], Timestamp::from_millis(0)).unwrap();
        store.claim(&AgentName::new("agent-1"), None, Timestamp::from_millis(0)).unwrap();
        let reclaimed = store.reclaim_expired_leases(Timestamp::from_millis(DEFAULT_CLAIM_LEASE_MILLIS + 1)).unwrap();
        assert_eq!(reclaimed, vec![TaskId::new("a")]);
        let task = store.get(&TaskId::new("a")).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.claimed_by.is_none());
    }
}
