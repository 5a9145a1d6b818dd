// vybe-store-sqlite/tests/proptest_dependencies.rs
// ============================================================================
// Module: Dependency Graph Acyclicity Property-Based Tests
// Description: Property tests asserting add_dependency never lets the task
//              graph form a cycle, across random edge sequences.
// Purpose: Detect panics and acyclicity invariant violations across wide
//          input ranges.
// ============================================================================

//! Property-based tests for the dependency graph's acyclicity invariant.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::HashSet;

use proptest::prelude::*;
use vybe_core::ProjectId;
use vybe_core::TaskId;
use vybe_core::Timestamp;
use vybe_store_sqlite::Store;
use vybe_store_sqlite::TaskStore;

const TASK_COUNT: usize = 6;

fn task_names() -> Vec<String> {
    (0..TASK_COUNT).map(|i| format!("t{i}")).collect()
}

fn edge_strategy() -> impl Strategy<Value = (usize, usize)> {
    (0..TASK_COUNT, 0..TASK_COUNT)
}

/// Reads every accepted `task_id -> depends_on_task_id` edge directly from
/// the database file, bypassing the store's own traversal so the property
/// doesn't just check itself.
fn read_edges(db_path: &std::path::Path) -> Vec<(String, String)> {
    let conn = rusqlite::Connection::open(db_path).expect("open ledger for inspection");
    let mut stmt = conn.prepare("SELECT task_id, depends_on_task_id FROM task_dependencies").expect("prepare");
    stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .expect("query edges")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect edges")
}

fn has_cycle(edges: &[(String, String)]) -> bool {
    let nodes: HashSet<&str> =
        edges.iter().flat_map(|(a, b)| [a.as_str(), b.as_str()]).collect();
    for start in nodes {
        let mut visited = HashSet::new();
        let mut frontier = vec![start];
        while let Some(current) = frontier.pop() {
            if !visited.insert(current) {
                continue;
            }
            for (task_id, depends_on) in edges {
                if task_id == current {
                    if depends_on == start {
                        return true;
                    }
                    frontier.push(depends_on.as_str());
                }
            }
        }
    }
    false
}

proptest! {
    #[test]
    fn add_dependency_never_produces_a_cycle(
        edges in prop::collection::vec(edge_strategy(), 0..40)
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("ledger.sqlite3");
        let store = TaskStore::new(Store::open(&db_path).expect("open ledger"));
        let ids = task_names();
        let now = Timestamp::from_millis(0);

        for id in &ids {
            let _ = store.create(TaskId::new(id.clone()), id.clone(), None, None::<ProjectId>, 0, &[], now);
        }

        for (from, to) in edges {
            if from == to {
                continue;
            }
            let _ = store.add_dependency(&TaskId::new(ids[from].clone()), &TaskId::new(ids[to].clone()), now);
        }

        prop_assert!(!has_cycle(&read_edges(&db_path)));
    }
}
