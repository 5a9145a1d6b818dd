// vybe-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Connection lifecycle, pragmas, and schema migration.
// Purpose: Open (or create) the single on-disk database file backing a
//          ledger, enforce durability pragmas, and hand out transactions.
// Dependencies: rusqlite, tracing, crate::error
// ============================================================================

//! ## Overview
//! [`Store`] owns the one `SQLite` connection a CLI invocation uses. Every
//! mutation runs inside a single transaction opened by [`Store::with_tx`]
//! and committed before the command returns its envelope; a crash before
//! commit leaves the prior state intact, and a crash after commit leaves the
//! new state intact; there is no partially-applied state observable from
//! outside the process.
//!
//! The connection is wrapped in `Arc<Mutex<_>>` even though a single CLI
//! invocation is one thread: it lets `Store` be cloned cheaply into
//! component structs (`TaskStore`, `EventLog`, ...) that each hold a handle
//! to the same connection without lifetime gymnastics.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;

use crate::error::StoreError;
use crate::error::StoreResult;

/// Current on-disk schema version. Bump and add a migration arm in
/// [`migrate`] whenever the schema changes in a way existing databases must
/// be upgraded to use.
const SCHEMA_VERSION: i64 = 1;

/// Busy-wait timeout before a lock contention error surfaces to the caller.
const BUSY_TIMEOUT_MS: u64 = 5_000;

/// A handle to the ledger's single `SQLite` connection.
///
/// Cheap to clone: clones share the same underlying connection and mutex.
#[derive(Clone)]
pub struct Store {
    connection: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if absent) the database at `path`, applies durability
    /// pragmas, and runs any pending schema migration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened, the pragmas
    /// cannot be applied, or the schema is at a version this binary does not
    /// know how to migrate from.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut connection = Connection::open(path)?;
        apply_pragmas(&connection)?;
        migrate(&mut connection)?;
        tracing::debug!(path = %path.display(), "opened ledger database");
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Opens an in-memory database, used by tests that do not need
    /// durability across process restarts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema migration fails.
    pub fn open_in_memory() -> StoreResult<Self> {
        let mut connection = Connection::open_in_memory()?;
        apply_pragmas(&connection)?;
        migrate(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Returns the schema version this binary writes and expects to find.
    #[must_use]
    pub const fn schema_version() -> i64 {
        SCHEMA_VERSION
    }

    /// Runs `f` inside a single transaction, committing on success and
    /// rolling back if `f` returns an error or panics.
    ///
    /// This is the crate's one durability boundary: every public mutation
    /// method on every component store goes through `with_tx` exactly once.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns, or a [`StoreError::Sqlite`] if the
    /// transaction itself cannot be opened or committed.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut connection =
            self.connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let tx = connection.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

fn apply_pragmas(connection: &Connection) -> StoreResult<()> {
    connection.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )?;
    connection.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
    Ok(())
}

fn migrate(connection: &mut Connection) -> StoreResult<()> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> =
        tx.query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
            .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            create_schema(&tx)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(StoreError::SchemaVersionMismatch(format!(
                "database is at schema version {value}, this binary supports {SCHEMA_VERSION}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

fn create_schema(tx: &Transaction<'_>) -> StoreResult<()> {
    tx.execute_batch(
        "CREATE TABLE tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            project_id TEXT,
            status TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            outcome TEXT,
            summary TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            completed_at INTEGER,
            claimed_by TEXT,
            claim_expires_at INTEGER
        );
        CREATE INDEX idx_tasks_status ON tasks (status);
        CREATE INDEX idx_tasks_project ON tasks (project_id);

        CREATE TABLE task_dependencies (
            task_id TEXT NOT NULL,
            depends_on_task_id TEXT NOT NULL,
            PRIMARY KEY (task_id, depends_on_task_id)
        );
        CREATE INDEX idx_task_deps_depends_on ON task_dependencies (depends_on_task_id);

        CREATE TABLE events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            message TEXT,
            task_id TEXT,
            session_id TEXT,
            agent_name TEXT NOT NULL,
            metadata TEXT,
            created_at INTEGER NOT NULL,
            archived INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX idx_events_task_id ON events (task_id);
        CREATE INDEX idx_events_created_at ON events (created_at);

        CREATE TABLE agent_cursors (
            agent_name TEXT PRIMARY KEY,
            last_seen_event_id INTEGER NOT NULL,
            focus_task_id TEXT,
            focus_project_id TEXT,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE memory_entries (
            scope TEXT NOT NULL,
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            expires_at INTEGER,
            ttl_millis INTEGER,
            touched_at INTEGER NOT NULL,
            PRIMARY KEY (scope, scope_id, key)
        );
        CREATE INDEX idx_memory_expires_at ON memory_entries (expires_at);

        CREATE TABLE artifacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id TEXT,
            kind TEXT NOT NULL,
            location TEXT NOT NULL,
            label TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX idx_artifacts_task_id ON artifacts (task_id);

        CREATE TABLE idempotency_log (
            request_id TEXT NOT NULL,
            command TEXT NOT NULL,
            agent_name TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (request_id, command)
        );",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_schema_and_is_idempotent_across_migrate_calls() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO tasks (id, title, status, priority, created_at, updated_at) \
                     VALUES ('t1', 'title', 'pending', 0, 0, 0)",
                    params![],
                )?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn with_tx_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: StoreResult<()> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO tasks (id, title, status, priority, created_at, updated_at) \
                 VALUES ('t1', 'title', 'pending', 0, 0, 0)",
                params![],
            )?;
            Err(StoreError::CorruptRow("forced rollback".to_string()))
        });
        assert!(result.is_err());
        let count: i64 = store
            .with_tx(|tx| {
                Ok(tx.query_row("SELECT COUNT(*) FROM tasks", params![], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
