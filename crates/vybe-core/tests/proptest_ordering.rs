// vybe-core/tests/proptest_ordering.rs
// ============================================================================
// Module: Task Ordering Property-Based Tests
// Description: Property tests for OrderingKey/select_best over random task
//              sets.
// Purpose: Detect panics and ordering invariant violations across wide
//          input ranges, independent of storage.
// ============================================================================

//! Property-based tests for the claim/next/focus selection ordering.

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

use proptest::prelude::*;
use vybe_core::Task;
use vybe_core::TaskId;
use vybe_core::TaskStatus;
use vybe_core::Timestamp;
use vybe_core::select_best;

fn task(id: &str, in_progress: bool, priority: i64, created_at_millis: i64) -> Task {
    Task {
        id: TaskId::new(id),
        title: id.to_string(),
        description: None,
        project_id: None,
        status: if in_progress { TaskStatus::InProgress } else { TaskStatus::Pending },
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

fn candidate_strategy() -> impl Strategy<Value = (String, bool, i64, i64)> {
    ("[a-z]{1,8}", any::<bool>(), -1000i64..1000, 0i64..1_000_000)
}

proptest! {
    #[test]
    fn select_best_never_panics_and_picks_a_member(
        candidates in prop::collection::vec(candidate_strategy(), 0..32)
    ) {
        let tasks: Vec<Task> = candidates
            .iter()
            .enumerate()
            .map(|(i, (id, in_progress, priority, created_at))| {
                task(&format!("{id}-{i}"), *in_progress, *priority, *created_at)
            })
            .collect();

        let best = select_best(&tasks);
        match best {
            None => prop_assert!(tasks.is_empty()),
            Some(winner) => prop_assert!(tasks.iter().any(|t| t.id.as_str() == winner.id.as_str())),
        }
    }

    #[test]
    fn in_progress_always_outranks_pending_regardless_of_priority(
        pending_priority in -1000i64..1000,
        in_progress_priority in -1000i64..1000,
        created_at in 0i64..1_000_000,
    ) {
        let pending = task("pending-task", false, pending_priority, created_at);
        let in_progress = task("in-progress-task", true, in_progress_priority, created_at);
        let winner = select_best(&[pending, in_progress]).expect("non-empty slice");
        prop_assert_eq!(winner.id.as_str(), "in-progress-task");
    }

    #[test]
    fn higher_priority_wins_within_the_same_status(
        lower in -1000i64..999,
        delta in 1i64..1000,
        created_at in 0i64..1_000_000,
    ) {
        let higher = lower + delta;
        let low = task("low-priority", false, lower, created_at);
        let high = task("high-priority", false, higher, created_at);
        let winner = select_best(&[low, high]).expect("non-empty slice");
        prop_assert_eq!(winner.id.as_str(), "high-priority");
    }

    #[test]
    fn earlier_created_at_wins_ties_on_status_and_priority(
        earlier in 0i64..500_000,
        gap in 1i64..500_000,
    ) {
        let later = earlier + gap;
        let old = task("old-task", false, 0, earlier);
        let new = task("new-task", false, 0, later);
        let winner = select_best(&[old, new]).expect("non-empty slice");
        prop_assert_eq!(winner.id.as_str(), "old-task");
    }
}
