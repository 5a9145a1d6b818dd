// vybe-store-sqlite/src/artifacts.rs
// ============================================================================
// Module: Artifact Index Store
// Description: Pointers to files, URIs, and commits linked to tasks.
// Purpose: Turn vybe_core::artifact types into SQL against `artifacts`.
// Dependencies: rusqlite, vybe_core, crate::store, crate::error
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use vybe_core::Artifact;
use vybe_core::ArtifactId;
use vybe_core::ArtifactKind;
use vybe_core::CoreError;
use vybe_core::TaskId;
use vybe_core::Timestamp;

use crate::store::Store;

/// Storage operations over the artifact index.
///
/// Deleting a task does not cascade to its linked artifacts: artifacts
/// remain addressable by ID after the task they were linked to is gone, with
/// `task_id` left pointing at an identifier that may no longer resolve.
pub struct ArtifactIndex {
    store: Store,
}

impl ArtifactIndex {
    /// Builds an artifact index over the given connection handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Records a new artifact, optionally linked to a task.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn add(
        &self,
        task_id: Option<&TaskId>,
        kind: ArtifactKind,
        location: &str,
        label: Option<&str>,
        now: Timestamp,
    ) -> Result<Artifact, CoreError> {
        self.store.with_tx(|tx| add_in_tx(tx, task_id, kind, location, label, now)).map_err(Into::into)
    }

    /// Returns one artifact by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no artifact has that ID, or
    /// [`CoreError::Internal`] on a storage failure.
    pub fn get(&self, id: ArtifactId) -> Result<Artifact, CoreError> {
        self.store
            .with_tx(|tx| fetch(tx, id.value()))
            .map_err(CoreError::from)?
            .ok_or_else(|| CoreError::NotFound(format!("artifact {id} not found")))
    }

    /// Lists all artifacts linked to a task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<Artifact>, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut stmt = tx.prepare(
                    "SELECT id, task_id, kind, location, label, created_at FROM artifacts
                     WHERE task_id = ?1 ORDER BY id DESC",
                )?;
                let rows = stmt.query_map(params![task_id.as_str()], row_to_artifact)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .map_err(Into::into)
    }

    /// Returns the total number of recorded artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn count(&self) -> Result<u64, CoreError> {
        self.store
            .with_tx(|tx| {
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM artifacts", params![], |row| row.get(0))?;
                Ok(u64::try_from(count).unwrap_or(0))
            })
            .map_err(Into::into)
    }

    /// Removes an artifact by ID; a no-op if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn remove(&self, id: ArtifactId) -> Result<(), CoreError> {
        self.store
            .with_tx(|tx| {
                tx.execute("DELETE FROM artifacts WHERE id = ?1", params![id.value()])?;
                Ok(())
            })
            .map_err(Into::into)
    }
}

/// Records one artifact using an already-open transaction.
///
/// Lets a caller that needs to commit an artifact alongside other writes
/// (e.g. `push`'s event-plus-artifacts) do so as one atomic unit via
/// [`crate::store::Store::with_tx`], rather than each write opening and
/// committing its own transaction.
///
/// # Errors
///
/// Returns [`crate::error::StoreError`] on a storage failure.
pub fn add_in_tx(
    tx: &rusqlite::Transaction<'_>,
    task_id: Option<&TaskId>,
    kind: ArtifactKind,
    location: &str,
    label: Option<&str>,
    now: Timestamp,
) -> crate::error::StoreResult<Artifact> {
    tx.execute(
        "INSERT INTO artifacts (task_id, kind, location, label, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![task_id.map(TaskId::as_str), kind.as_str(), location, label, now.as_millis()],
    )?;
    let id = tx.last_insert_rowid();
    fetch(tx, id)?
        .ok_or_else(|| crate::error::StoreError::CorruptRow("insert did not persist".to_string()))
}

fn fetch(tx: &rusqlite::Transaction<'_>, id: i64) -> crate::error::StoreResult<Option<Artifact>> {
    tx.query_row(
        "SELECT id, task_id, kind, location, label, created_at FROM artifacts WHERE id = ?1",
        params![id],
        row_to_artifact,
    )
    .optional()
    .map_err(Into::into)
}

fn row_to_artifact(row: &Row<'_>) -> rusqlite::Result<Artifact> {
    let kind: String = row.get(2)?;
    let kind = ArtifactKind::parse(&kind)
        .map_err(|err| rusqlite::Error::InvalidColumnType(2, err.to_string(), rusqlite::types::Type::Text))?;
    Ok(Artifact {
        id: ArtifactId::new(row.get(0)?),
        task_id: row.get::<_, Option<String>>(1)?.map(TaskId::new),
        kind,
        location: row.get(3)?,
        label: row.get(4)?,
        created_at: Timestamp::from_millis(row.get(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_list_for_task_round_trips() {
        let index = ArtifactIndex::new(Store::open_in_memory().unwrap());
        let task_id = TaskId::new("t1");
        index
            .add(Some(&task_id), ArtifactKind::File, "/tmp/out.log", None, Timestamp::from_millis(0))
            .unwrap();
        let artifacts = index.list_for_task(&task_id).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].location, "/tmp/out.log");
    }

    #[test]
    fn get_returns_a_previously_added_artifact() {
        let index = ArtifactIndex::new(Store::open_in_memory().unwrap());
        let added = index
            .add(None, ArtifactKind::Commit, "deadbeef", Some("release tag"), Timestamp::from_millis(0))
            .unwrap();
        let fetched = index.get(added.id).unwrap();
        assert_eq!(fetched.location, "deadbeef");
        assert_eq!(fetched.label.as_deref(), Some("release tag"));
    }

    #[test]
    fn get_fails_for_an_unknown_id() {
        let index = ArtifactIndex::new(Store::open_in_memory().unwrap());
        assert!(index.get(ArtifactId::new(999)).is_err());
    }

    #[test]
    fn remove_is_a_no_op_for_an_unknown_id() {
        let index = ArtifactIndex::new(Store::open_in_memory().unwrap());
        assert!(index.remove(ArtifactId::new(999)).is_ok());
    }

    #[test]
    fn count_reflects_total_artifacts() {
        let index = ArtifactIndex::new(Store::open_in_memory().unwrap());
        assert_eq!(index.count().unwrap(), 0);
        index.add(None, ArtifactKind::Uri, "https://example.test", None, Timestamp::from_millis(0)).unwrap();
        assert_eq!(index.count().unwrap(), 1);
    }
}
