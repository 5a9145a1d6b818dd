// vybe-cli/src/commands/hook.rs
// ============================================================================
// Module: Hook Adapter
// Description: Reads one JSON payload from stdin and re-dispatches it onto
//              the same core calls the direct CLI subcommands use.
// Purpose: Implement the §4.9 hook-name-to-core-effect table.
// Dependencies: serde, serde_json, vybe_core, vybe_store_sqlite, crate::context
// ============================================================================

//! ## Overview
//! Every hook maps to one of the mutations `task`/`events`/`memory`/`resume`
//! already expose; this module never opens its own code path for a mutation
//! the direct CLI surface also performs. Malformed stdin or an unrecognized
//! hook name is logged at `warn` and degrades to a no-op success envelope
//! rather than a hard failure.

use serde::Deserialize;
use vybe_core::CoreError;
use vybe_core::EventKind;
use vybe_core::Timestamp;
use vybe_store_sqlite::BriefAssembler;
use vybe_store_sqlite::EventLog;
use vybe_store_sqlite::MemoryStore;

use crate::context::Context;
use crate::outcome::CliOutcome;

/// The stdin payload shape common to every hook, per §4.9.
#[derive(Debug, Deserialize)]
struct HookPayload {
    session_id: Option<String>,
    #[allow(dead_code, reason = "accepted per the payload shape, not yet consulted by any hook")]
    cwd: Option<String>,
    prompt: Option<String>,
    tool_name: Option<String>,
    tool_input: Option<serde_json::Value>,
    #[allow(dead_code, reason = "accepted per the payload shape, not yet consulted by any hook")]
    tool_response: Option<serde_json::Value>,
    description: Option<String>,
    #[allow(dead_code, reason = "accepted per the payload shape, not yet consulted by any hook")]
    source: Option<String>,
}

/// Dispatches one hook invocation.
///
/// `name` is the dash-cased hook name from the CLI argument, e.g.
/// `session-start`. Stdin must contain one [`HookPayload`] JSON object.
///
/// # Errors
///
/// Never returns an error from a malformed payload or unknown hook name —
/// both degrade to [`CliOutcome::SuccessEmpty`] after a `warn` log. Storage
/// errors from a recognized hook's core call still propagate.
#[allow(clippy::too_many_arguments, reason = "one handle per component store the hooks may touch")]
pub fn handle(
    name: &str,
    stdin: &mut dyn std::io::Read,
    assembler: &BriefAssembler,
    events: &EventLog,
    memory: &MemoryStore,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    let payload: HookPayload = match serde_json::from_reader(stdin) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(hook = name, error = %err, "malformed hook payload, degrading to no-op");
            return Ok(CliOutcome::SuccessEmpty);
        }
    };

    match name {
        "session-start" => {
            let brief = assembler.assemble(&context.agent, false, now)?;
            let data = serde_json::to_value(&brief).unwrap_or_default();
            Ok(CliOutcome::HookSessionStart {
                data,
                additional_context: brief.additional_context,
            })
        }
        "prompt" => {
            let message = payload.prompt.unwrap_or_default();
            append_event(events, EventKind::UserPrompt, Some(message), context, now)
        }
        "tool-success" => {
            if payload.tool_name.as_deref() == Some("Read") {
                return Ok(CliOutcome::SuccessEmpty);
            }
            let metadata = tool_metadata(payload.tool_name, payload.tool_input);
            append_event_with_metadata(events, EventKind::ToolSuccess, None, metadata, context, now)
        }
        "tool-failure" => {
            if payload.tool_name.as_deref() == Some("Read") {
                return Ok(CliOutcome::SuccessEmpty);
            }
            let metadata = tool_metadata(payload.tool_name, payload.tool_input);
            append_event_with_metadata(events, EventKind::ToolFailure, None, metadata, context, now)
        }
        "checkpoint" => {
            if let Err(err) = memory.gc_expired(now) {
                tracing::warn!(error = %err, "checkpoint memory gc failed, continuing best-effort");
            }
            Ok(CliOutcome::SuccessEmpty)
        }
        "session-end" => Ok(CliOutcome::SuccessEmpty),
        "subagent-start" => {
            append_event(events, EventKind::AgentSpawned, payload.description, context, now)
        }
        "subagent-stop" => append_event(events, EventKind::AgentCompleted, None, context, now),
        "stop" => append_event(events, EventKind::Heartbeat, None, context, now),
        "task-completed" => append_event(events, EventKind::Summary, None, context, now),
        "retrospective" => {
            let message = payload.session_id.map(|id| format!("retrospective for session {id}"));
            append_event(events, EventKind::Summary, message, context, now)
        }
        other => {
            tracing::warn!(hook = other, "unknown hook name, degrading to no-op");
            Ok(CliOutcome::SuccessEmpty)
        }
    }
}

fn tool_metadata(
    tool_name: Option<String>,
    tool_input: Option<serde_json::Value>,
) -> Option<serde_json::Value> {
    if tool_name.is_none() && tool_input.is_none() {
        return None;
    }
    Some(serde_json::json!({ "tool_name": tool_name, "tool_input": tool_input }))
}

fn append_event(
    events: &EventLog,
    kind: EventKind,
    message: Option<String>,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    append_event_with_metadata(events, kind, message, None, context, now)
}

fn append_event_with_metadata(
    events: &EventLog,
    kind: EventKind,
    message: Option<String>,
    metadata: Option<serde_json::Value>,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    let event = events.append(kind, message, None, None, &context.agent, metadata, now)?;
    Ok(CliOutcome::Success(serde_json::to_value(event).unwrap_or_default()))
}
