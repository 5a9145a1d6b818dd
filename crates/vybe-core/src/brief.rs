// vybe-core/src/brief.rs
// ============================================================================
// Module: Vybe Resume Brief Assembly
// Description: The bundle handed back by `resume`, plus its pure rendering.
// Purpose: Keep the human-readable summary testable independent of SQL.
// Dependencies: serde, crate::task, crate::event, crate::memory, crate::artifact
// ============================================================================

//! ## Overview
//! [`Brief`] is the shape `resume` and `resume --peek` both return. The
//! storage crate is responsible for gathering its fields (focus task
//! selection, event deltas since the agent's cursor, relevant memory,
//! linked artifacts); this module owns only the parts that have no SQL in
//! them: the struct itself and [`render_additional_context`], which turns
//! those fields into the single human-readable string agents are expected
//! to read first.

use serde::Deserialize;
use serde::Serialize;

use crate::artifact::Artifact;
use crate::event::Event;
use crate::memory::MemoryEntry;
use crate::task::Task;

/// Everything handed back to an agent resuming work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    /// The task the agent should work on next, if one was selected.
    pub focus_task: Option<Task>,
    /// Events with `id > last_seen_event_id`, oldest first.
    pub events_since_cursor: Vec<Event>,
    /// Memory entries visible at global scope plus the focus task's project
    /// and task scopes, deduplicated by key with the narrowest scope
    /// winning (task over project over global).
    pub relevant_memory: Vec<MemoryEntry>,
    /// Artifacts linked to the focus task.
    pub linked_artifacts: Vec<Artifact>,
    /// Human-readable summary, see [`render_additional_context`].
    pub additional_context: String,
    /// Event ID the cursor was advanced to (omitted entirely under `--peek`,
    /// where the cursor is left untouched).
    pub advanced_to_event_id: Option<i64>,
}

/// Renders the `additional_context` human-readable summary.
///
/// The focus task's title always appears verbatim in the output when a
/// focus task is present, so downstream readers can `grep` for it.
#[must_use]
pub fn render_additional_context(
    focus_task: Option<&Task>,
    events_since_cursor: &[Event],
    relevant_memory: &[MemoryEntry],
    linked_artifacts: &[Artifact],
) -> String {
    let mut out = String::new();

    match focus_task {
        Some(task) => {
            out.push_str(&format!("Focus task: {} ({})\n", task.title, task.id.as_str()));
            if let Some(description) = &task.description {
                out.push_str(&format!("  {description}\n"));
            }
        }
        None => out.push_str("No focus task selected.\n"),
    }

    if events_since_cursor.is_empty() {
        out.push_str("No new events since last resume.\n");
    } else {
        out.push_str(&format!("{} new event(s) since last resume:\n", events_since_cursor.len()));
        for event in events_since_cursor.iter().rev().take(5) {
            let message = event.message.as_deref().unwrap_or("");
            out.push_str(&format!("  - [{}] {message}\n", event.kind.as_str()));
        }
    }

    if !relevant_memory.is_empty() {
        out.push_str(&format!("{} memory entr(ies) in scope:\n", relevant_memory.len()));
        for entry in relevant_memory.iter().take(10) {
            out.push_str(&format!("  - {}: {}\n", entry.key, entry.value));
        }
    }

    if !linked_artifacts.is_empty() {
        out.push_str(&format!("{} linked artifact(s):\n", linked_artifacts.len()));
        for artifact in linked_artifacts {
            let label = artifact.label.as_deref().unwrap_or(artifact.location.as_str());
            out.push_str(&format!("  - {label}\n"));
        }
    }

    out
}
