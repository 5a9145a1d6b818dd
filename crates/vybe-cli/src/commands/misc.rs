// vybe-cli/src/commands/misc.rs
// ============================================================================
// Module: Upgrade, Status, Schema, Snapshot, Digest, Loop-Stats, Ingest
// Description: The read-only/maintenance subcommands that round out the CLI
//              surface beyond the core task/event/memory/artifact mutations.
// Purpose: Dispatch §6/§10.6's supplemented surface onto the component
//          stores, without opening any SQL of their own.
// Dependencies: serde_json, vybe_core, vybe_store_sqlite, crate::cli,
//               crate::context, crate::outcome
// ============================================================================

use std::collections::BTreeMap;
use std::fs;

use vybe_core::CoreError;
use vybe_core::EventFilter;
use vybe_core::EventKind;
use vybe_core::Order;
use vybe_core::Timestamp;
use vybe_store_sqlite::ArtifactIndex;
use vybe_store_sqlite::BriefAssembler;
use vybe_store_sqlite::EventLog;
use vybe_store_sqlite::MemoryStore;
use vybe_store_sqlite::Store;
use vybe_store_sqlite::TaskStore;

use crate::cli::IngestArgs;
use crate::cli::IngestSource;
use crate::cli::StatusArgs;
use crate::context::Context;
use crate::outcome::CliOutcome;

/// The full subcommand catalog, printed by `schema --commands`.
const COMMAND_CATALOG: &[&str] = &[
    "upgrade",
    "task create|get|list|begin|complete|set-status|set-priority|add-dep|remove-dep|delete|next|claim|heartbeat|gc|unlocks|stats",
    "push",
    "events list|add|summarize <from> <through> <summary>",
    "memory set|get|list|query|delete|touch|compact|gc",
    "artifact add|list|get",
    "resume",
    "status",
    "hook <name>",
    "ingest history",
    "schema",
    "snapshot",
    "session-digest",
    "loop-stats",
];

/// Handles `upgrade`: the migration already ran when the `Store` was opened,
/// so this simply reports the version it settled on.
///
/// # Errors
///
/// This handler is infallible; the signature matches its siblings for
/// uniform dispatch.
pub fn handle_upgrade() -> Result<CliOutcome, CoreError> {
    Ok(CliOutcome::Success(serde_json::json!({ "schema_version": Store::schema_version() })))
}

/// Handles `status`: confirms the ledger is queryable and reports aggregate
/// counts.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_status(
    args: StatusArgs,
    tasks: &TaskStore,
    events: &EventLog,
) -> Result<CliOutcome, CoreError> {
    let task_stats = tasks.stats()?;
    let event_count = events.count()?;
    if args.check {
        return Ok(CliOutcome::Success(serde_json::json!({ "query_ok": true })));
    }
    Ok(CliOutcome::Success(serde_json::json!({
        "query_ok": true,
        "schema_version": Store::schema_version(),
        "tasks": task_stats,
        "events": event_count,
    })))
}

/// Handles `schema`: the schema version, or the full command catalog when
/// `commands` is set.
///
/// # Errors
///
/// This handler is infallible; the signature matches its siblings for
/// uniform dispatch.
pub fn handle_schema(commands: bool) -> Result<CliOutcome, CoreError> {
    if commands {
        return Ok(CliOutcome::Success(serde_json::json!({ "commands": COMMAND_CATALOG })));
    }
    Ok(CliOutcome::Success(serde_json::json!({ "schema_version": Store::schema_version() })))
}

/// Handles `snapshot`: a point-in-time counts-only view, bounded regardless
/// of ledger size.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_snapshot(
    tasks: &TaskStore,
    events: &EventLog,
    memory: &MemoryStore,
    artifacts: &ArtifactIndex,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    Ok(CliOutcome::Success(serde_json::json!({
        "tasks": tasks.stats()?,
        "events": events.count()?,
        "memory_live": memory.count_live(now)?,
        "artifacts": artifacts.count()?,
    })))
}

/// Handles `session-digest`: the same data `resume --peek` would assemble,
/// rendered for a human instead of returned as a raw brief.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_session_digest(
    assembler: &BriefAssembler,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    let brief = assembler.assemble(&context.agent, true, now)?;
    let focus_line = brief
        .focus_task
        .as_ref()
        .map_or_else(|| "no focus task".to_string(), |task| format!("{} ({})", task.title, task.id.as_str()));
    let digest = format!(
        "focus: {focus_line}\ndeltas: {} event(s) since last resume\nmemory: {} relevant entr{}\nartifacts: {} linked\n\n{}",
        brief.events_since_cursor.len(),
        brief.relevant_memory.len(),
        if brief.relevant_memory.len() == 1 { "y" } else { "ies" },
        brief.linked_artifacts.len(),
        brief.additional_context,
    );
    Ok(CliOutcome::Success(serde_json::json!({ "digest": digest })))
}

/// Handles `loop-stats`: event throughput by kind over the last `sample`
/// events, a lightweight operator diagnostic rather than a general analytic
/// surface.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_loop_stats(sample: u32, events: &EventLog) -> Result<CliOutcome, CoreError> {
    let filter = EventFilter { order: Order::Desc, limit: Some(sample), ..EventFilter::default() };
    let recent = events.list(&filter)?;
    let mut by_kind: BTreeMap<&'static str, u64> = BTreeMap::new();
    for event in &recent {
        *by_kind.entry(event.kind.as_str()).or_insert(0) += 1;
    }
    Ok(CliOutcome::Success(serde_json::json!({
        "sampled": recent.len(),
        "by_kind": by_kind,
    })))
}

/// Handles `ingest history --file`: imports a `.jsonl` file of prior
/// conversation turns, one `{"prompt": "..."}` object per line, as
/// `user_prompt` events.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] if the file cannot be read or a
/// line is not valid JSON, or whatever error the event append produces.
pub fn handle_ingest(
    args: IngestArgs,
    events: &EventLog,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    let IngestSource::History { file } = args.source;
    let contents = fs::read_to_string(&file)
        .map_err(|err| CoreError::InvalidArgument(format!("cannot read {file}: {err}")))?;

    let mut imported = 0u64;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|err| CoreError::InvalidArgument(format!("malformed history line: {err}")))?;
        let prompt = value.get("prompt").and_then(serde_json::Value::as_str).map(str::to_string);
        events.append(EventKind::UserPrompt, prompt, None, None, &context.agent, None, now)?;
        imported += 1;
    }

    Ok(CliOutcome::Success(serde_json::json!({ "imported": imported })))
}
