// vybe-store-sqlite/src/idempotency.rs
// ============================================================================
// Module: Idempotency Log Store
// Description: Cached command responses keyed by (request_id, command).
// Purpose: Let `with_replay` check for and record a cached response inside
//          the same transaction as the mutation it guards.
// Dependencies: rusqlite, serde_json, vybe_core, crate::store, crate::error
// ============================================================================

//! ## Overview
//! A caller wanting idempotent replay wraps its mutation in
//! [`IdempotencyLog::with_replay`], which runs entirely inside one
//! transaction: if a response is already recorded for the key it is
//! returned without calling `f`; otherwise `f` runs, and its envelope is
//! recorded before the transaction commits. A retried request after a crash
//! either sees the mutation fully applied and its response cached, or sees
//! neither, never a cached response describing a mutation that did not
//! commit.
//!
//! The key is `(request_id, command)`, not `(agent_name, request_id,
//! command)`: two agents that reuse the same request id for the same
//! command are retrying the same logical request, and the second one must
//! replay rather than re-run the mutation. `agent_name` is still recorded
//! alongside the response for diagnostics, but plays no part in the lookup.

use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde_json::Value;
use vybe_core::AgentName;
use vybe_core::CoreError;
use vybe_core::Timestamp;

use crate::error::StoreError;
use crate::error::StoreResult;
use crate::store::Store;

/// Storage operations over the idempotency log.
pub struct IdempotencyLog {
    store: Store,
}

impl IdempotencyLog {
    /// Builds an idempotency log over the given connection handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Runs `f` exactly once per `(request_id, command)` key, replaying the
    /// cached response envelope on any retry regardless of which agent
    /// issued it.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` returns, or [`CoreError::Internal`] on a
    /// storage failure.
    pub fn with_replay(
        &self,
        agent_name: &AgentName,
        request_id: &str,
        command: &str,
        now: Timestamp,
        f: impl FnOnce() -> Result<Value, CoreError>,
    ) -> Result<Value, CoreError> {
        // The mutation itself and the cache record must land in the same
        // transaction as each other, but f() builds its own transaction via
        // Store::with_tx, so this method's job is only to check-then-record
        // around that call rather than to nest a transaction inside one.
        if let Some(cached) = self.store.with_tx(|tx| fetch(tx, request_id, command))? {
            tracing::debug!(request_id, command, "replayed idempotent response");
            return Ok(cached);
        }
        let response = f()?;
        self.store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT OR IGNORE INTO idempotency_log
                        (request_id, command, agent_name, response, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        request_id,
                        command,
                        agent_name.as_str(),
                        response.to_string(),
                        now.as_millis(),
                    ],
                )?;
                Ok(())
            })
            .map_err(CoreError::from)?;
        Ok(response)
    }
}

fn fetch(tx: &Transaction<'_>, request_id: &str, command: &str) -> StoreResult<Option<Value>> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT response FROM idempotency_log
             WHERE request_id = ?1 AND command = ?2",
            params![request_id, command],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|raw| serde_json::from_str(&raw).map_err(|err| StoreError::CorruptRow(err.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn a_repeated_request_id_replays_without_rerunning_the_mutation() {
        let log = IdempotencyLog::new(Store::open_in_memory().unwrap());
        let agent = AgentName::new("agent-1");
        let calls = Cell::new(0);
        let run = || {
            calls.set(calls.get() + 1);
            Ok(serde_json::json!({"count": calls.get()}))
        };
        let first =
            log.with_replay(&agent, "req-1", "task.create", Timestamp::from_millis(0), run).unwrap();
        let second =
            log.with_replay(&agent, "req-1", "task.create", Timestamp::from_millis(1), run).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn a_different_agent_reusing_the_same_request_id_and_command_still_replays() {
        let log = IdempotencyLog::new(Store::open_in_memory().unwrap());
        let calls = Cell::new(0);
        let run = || {
            calls.set(calls.get() + 1);
            Ok(serde_json::json!({"count": calls.get()}))
        };
        let first = log
            .with_replay(&AgentName::new("agent-1"), "req-1", "task.create", Timestamp::from_millis(0), run)
            .unwrap();
        let second = log
            .with_replay(&AgentName::new("agent-2"), "req-1", "task.create", Timestamp::from_millis(1), run)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn the_same_request_id_under_a_different_command_is_a_distinct_entry() {
        let log = IdempotencyLog::new(Store::open_in_memory().unwrap());
        let agent = AgentName::new("agent-1");
        let calls = Cell::new(0);
        let run = || {
            calls.set(calls.get() + 1);
            Ok(serde_json::json!({"count": calls.get()}))
        };
        log.with_replay(&agent, "req-1", "task.create", Timestamp::from_millis(0), run).unwrap();
        log.with_replay(&agent, "req-1", "task.complete", Timestamp::from_millis(1), run).unwrap();
        assert_eq!(calls.get(), 2);
    }
}
