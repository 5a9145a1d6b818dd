// vybe-store-sqlite/src/memory.rs
// ============================================================================
// Module: Memory Store
// Description: Scoped key-value store with TTL and pattern query.
// Purpose: Turn vybe_core::memory types into SQL against `memory_entries`.
// Dependencies: rusqlite, vybe_core, crate::store, crate::error
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use vybe_core::CoreError;
use vybe_core::MemoryEntry;
use vybe_core::MemoryScope;
use vybe_core::Timestamp;

use crate::store::Store;

/// Storage operations over the scoped memory table.
pub struct MemoryStore {
    store: Store,
}

impl MemoryStore {
    /// Builds a memory store over the given connection handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Sets (inserting or overwriting) a memory entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `scope`/`scope_id` violate
    /// the scoping invariant.
    pub fn set(
        &self,
        scope: MemoryScope,
        scope_id: &str,
        key: &str,
        value: &str,
        ttl_millis: Option<i64>,
        now: Timestamp,
    ) -> Result<MemoryEntry, CoreError> {
        scope.validate_scope_id(scope_id)?;
        let expires_at = ttl_millis.map(|ttl| now.plus_millis(ttl).as_millis());
        self.store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO memory_entries
                        (scope, scope_id, key, value, created_at, updated_at, expires_at, \
                         ttl_millis, touched_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?5)
                     ON CONFLICT (scope, scope_id, key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at,
                        expires_at = excluded.expires_at,
                        ttl_millis = excluded.ttl_millis,
                        touched_at = excluded.touched_at",
                    params![
                        scope.as_str(),
                        scope_id,
                        key,
                        value,
                        now.as_millis(),
                        expires_at,
                        ttl_millis,
                    ],
                )?;
                fetch(tx, scope, scope_id, key)?.ok_or_else(|| {
                    crate::error::StoreError::CorruptRow("upsert did not persist".to_string())
                })
            })
            .map_err(Into::into)
    }

    /// Fetches a single live (non-expired) entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the entry is absent or expired.
    pub fn get(
        &self,
        scope: MemoryScope,
        scope_id: &str,
        key: &str,
        now: Timestamp,
    ) -> Result<MemoryEntry, CoreError> {
        self.store
            .with_tx(|tx| {
                let entry = fetch(tx, scope, scope_id, key)?;
                match entry {
                    Some(entry) if !entry.is_expired(now) => Ok(entry),
                    _ => Err(crate::error::StoreError::CorruptRow(format!(
                        "not_found:memory key {key}"
                    ))),
                }
            })
            .map_err(map_not_found)
    }

    /// Extends a live entry's expiry by its originally recorded TTL window,
    /// leaving permanent (no-TTL) entries untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the entry is absent or already
    /// expired.
    pub fn touch(
        &self,
        scope: MemoryScope,
        scope_id: &str,
        key: &str,
        now: Timestamp,
    ) -> Result<MemoryEntry, CoreError> {
        self.store
            .with_tx(|tx| {
                let entry = fetch(tx, scope, scope_id, key)?.ok_or_else(|| {
                    crate::error::StoreError::CorruptRow(format!("not_found:memory key {key}"))
                })?;
                if entry.is_expired(now) {
                    return Err(crate::error::StoreError::CorruptRow(format!(
                        "not_found:memory key {key}"
                    )));
                }
                let new_expires_at = entry.ttl_millis.map(|ttl| now.plus_millis(ttl).as_millis());
                tx.execute(
                    "UPDATE memory_entries SET expires_at = ?1, touched_at = ?2
                     WHERE scope = ?3 AND scope_id = ?4 AND key = ?5",
                    params![new_expires_at, now.as_millis(), scope.as_str(), scope_id, key],
                )?;
                fetch(tx, scope, scope_id, key)?.ok_or_else(|| {
                    crate::error::StoreError::CorruptRow("update did not persist".to_string())
                })
            })
            .map_err(map_not_found)
    }

    /// Deletes an entry if present; a no-op if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn delete(&self, scope: MemoryScope, scope_id: &str, key: &str) -> Result<(), CoreError> {
        self.store
            .with_tx(|tx| {
                tx.execute(
                    "DELETE FROM memory_entries WHERE scope = ?1 AND scope_id = ?2 AND key = ?3",
                    params![scope.as_str(), scope_id, key],
                )?;
                Ok(())
            })
            .map_err(Into::into)
    }

    /// Lists live entries in a single scope.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn list(
        &self,
        scope: MemoryScope,
        scope_id: &str,
        now: Timestamp,
    ) -> Result<Vec<MemoryEntry>, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut stmt = tx.prepare(
                    "SELECT scope, scope_id, key, value, created_at, updated_at, expires_at, \
                     ttl_millis, touched_at FROM memory_entries
                     WHERE scope = ?1 AND scope_id = ?2 AND (expires_at IS NULL OR expires_at >= ?3)
                     ORDER BY key ASC",
                )?;
                let rows =
                    stmt.query_map(params![scope.as_str(), scope_id, now.as_millis()], row_to_entry)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .map_err(Into::into)
    }

    /// Lists live entries across global scope plus one project and/or task
    /// scope, with `SQL LIKE`-style key pattern filtering.
    ///
    /// Used by the brief assembler: narrower scopes are listed after the
    /// global scope so callers can let task/project entries shadow global
    /// ones sharing a key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn query(
        &self,
        key_pattern: Option<&str>,
        project_scope_id: Option<&str>,
        task_scope_id: Option<&str>,
        now: Timestamp,
    ) -> Result<Vec<MemoryEntry>, CoreError> {
        self.store
            .with_tx(|tx| {
                let mut out = Vec::new();
                out.extend(query_scope(tx, MemoryScope::Global, "", key_pattern, now)?);
                if let Some(scope_id) = project_scope_id {
                    out.extend(query_scope(tx, MemoryScope::Project, scope_id, key_pattern, now)?);
                }
                if let Some(scope_id) = task_scope_id {
                    out.extend(query_scope(tx, MemoryScope::Task, scope_id, key_pattern, now)?);
                }
                Ok(out)
            })
            .map_err(Into::into)
    }

    /// Returns the number of currently-live (non-expired) entries.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn count_live(&self, now: Timestamp) -> Result<u64, CoreError> {
        self.store
            .with_tx(|tx| {
                let count: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM memory_entries WHERE expires_at IS NULL OR expires_at >= ?1",
                    params![now.as_millis()],
                    |row| row.get(0),
                )?;
                Ok(u64::try_from(count).unwrap_or(0))
            })
            .map_err(Into::into)
    }

    /// Deletes every expired entry, returning the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] on a storage failure.
    pub fn gc_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        self.store
            .with_tx(|tx| {
                let count = tx.execute(
                    "DELETE FROM memory_entries WHERE expires_at IS NOT NULL AND expires_at < ?1",
                    params![now.as_millis()],
                )?;
                if count > 0 {
                    tracing::debug!(count, "garbage collected expired memory entries");
                }
                Ok(u64::try_from(count).unwrap_or(0))
            })
            .map_err(Into::into)
    }
}

fn map_not_found(err: crate::error::StoreError) -> CoreError {
    if let crate::error::StoreError::CorruptRow(msg) = &err
        && let Some(rest) = msg.strip_prefix("not_found:")
    {
        return CoreError::NotFound(rest.to_string());
    }
    err.into()
}

fn query_scope(
    tx: &Transaction<'_>,
    scope: MemoryScope,
    scope_id: &str,
    key_pattern: Option<&str>,
    now: Timestamp,
) -> crate::error::StoreResult<Vec<MemoryEntry>> {
    let mut stmt = tx.prepare(
        "SELECT scope, scope_id, key, value, created_at, updated_at, expires_at, ttl_millis, \
         touched_at FROM memory_entries
         WHERE scope = ?1 AND scope_id = ?2
           AND (expires_at IS NULL OR expires_at >= ?3)
           AND (?4 IS NULL OR key LIKE ?4)
         ORDER BY key ASC",
    )?;
    let rows = stmt.query_map(
        params![scope.as_str(), scope_id, now.as_millis(), key_pattern],
        row_to_entry,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn fetch(
    tx: &Transaction<'_>,
    scope: MemoryScope,
    scope_id: &str,
    key: &str,
) -> crate::error::StoreResult<Option<MemoryEntry>> {
    tx.query_row(
        "SELECT scope, scope_id, key, value, created_at, updated_at, expires_at, ttl_millis, \
         touched_at FROM memory_entries WHERE scope = ?1 AND scope_id = ?2 AND key = ?3",
        params![scope.as_str(), scope_id, key],
        row_to_entry,
    )
    .optional()
    .map_err(Into::into)
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<MemoryEntry> {
    let scope: String = row.get(0)?;
    let scope = MemoryScope::parse(&scope)
        .map_err(|err| rusqlite::Error::InvalidColumnType(0, err.to_string(), rusqlite::types::Type::Text))?;
    Ok(MemoryEntry {
        scope,
        scope_id: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
        created_at: Timestamp::from_millis(row.get(4)?),
        updated_at: Timestamp::from_millis(row.get(5)?),
        expires_at: row.get::<_, Option<i64>>(6)?.map(Timestamp::from_millis),
        ttl_millis: row.get(7)?,
        touched_at: Timestamp::from_millis(row.get(8)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_store() -> MemoryStore {
        MemoryStore::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = fresh_store();
        store
            .set(MemoryScope::Global, "", "greeting", "hello", None, Timestamp::from_millis(0))
            .unwrap();
        let entry = store.get(MemoryScope::Global, "", "greeting", Timestamp::from_millis(1)).unwrap();
        assert_eq!(entry.value, "hello");
    }

    #[test]
    fn project_scope_requires_non_empty_scope_id() {
        let store = fresh_store();
        let result = store.set(MemoryScope::Project, "", "k", "v", None, Timestamp::from_millis(0));
        assert!(result.is_err());
    }

    #[test]
    fn expired_entries_are_not_returned_by_get() {
        let store = fresh_store();
        store
            .set(MemoryScope::Global, "", "k", "v", Some(100), Timestamp::from_millis(0))
            .unwrap();
        let result = store.get(MemoryScope::Global, "", "k", Timestamp::from_millis(200));
        assert!(result.is_err());
    }

    #[test]
    fn touch_extends_expiry_by_original_ttl_window() {
        let store = fresh_store();
        store
            .set(MemoryScope::Global, "", "k", "v", Some(100), Timestamp::from_millis(0))
            .unwrap();
        let touched = store.touch(MemoryScope::Global, "", "k", Timestamp::from_millis(50)).unwrap();
        assert_eq!(touched.expires_at, Some(Timestamp::from_millis(150)));
    }

    #[test]
    fn gc_expired_removes_only_expired_rows() {
        let store = fresh_store();
        store
            .set(MemoryScope::Global, "", "expired", "v", Some(10), Timestamp::from_millis(0))
            .unwrap();
        store
            .set(MemoryScope::Global, "", "alive", "v", None, Timestamp::from_millis(0))
            .unwrap();
        let removed = store.gc_expired(Timestamp::from_millis(100)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(MemoryScope::Global, "", "alive", Timestamp::from_millis(100)).is_ok());
    }

    #[test]
    fn query_unions_global_project_and_task_scopes() {
        let store = fresh_store();
        store.set(MemoryScope::Global, "", "g", "1", None, Timestamp::from_millis(0)).unwrap();
        store.set(MemoryScope::Project, "proj", "p", "2", None, Timestamp::from_millis(0)).unwrap();
        store.set(MemoryScope::Task, "task-1", "t", "3", None, Timestamp::from_millis(0)).unwrap();
        let results =
            store.query(None, Some("proj"), Some("task-1"), Timestamp::from_millis(1)).unwrap();
        assert_eq!(results.len(), 3);
    }
}
