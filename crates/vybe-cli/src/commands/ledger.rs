// vybe-cli/src/commands/ledger.rs
// ============================================================================
// Module: Events, Memory, Artifact, and Push Subcommand Handlers
// Description: Dispatches `vybe events|memory|artifact|push ...`.
// Purpose: Translate parsed CLI args into core calls and JSON payloads.
// Dependencies: serde_json, vybe_core, vybe_store_sqlite, crate::cli,
//               crate::context, crate::outcome
// ============================================================================

use vybe_core::ArtifactId;
use vybe_core::ArtifactKind;
use vybe_core::CoreError;
use vybe_core::EventFilter;
use vybe_core::EventId;
use vybe_core::EventKind;
use vybe_core::MemoryScope;
use vybe_core::TaskId;
use vybe_core::Timestamp;
use vybe_store_sqlite::ArtifactIndex;
use vybe_store_sqlite::EventLog;
use vybe_store_sqlite::MemoryStore;
use vybe_store_sqlite::Store;
use vybe_store_sqlite::add_artifact_in_tx;
use vybe_store_sqlite::append_event_in_tx;

use crate::cli::ArtifactCommands;
use crate::cli::EventsCommands;
use crate::cli::MemoryCommands;
use crate::context::Context;
use crate::outcome::CliOutcome;

/// Dispatches one `events` subcommand.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_events(
    command: EventsCommands,
    events: &EventLog,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    match command {
        EventsCommands::List { kind, task, since, limit, include_archived } => {
            let filter = EventFilter {
                kind: kind.map(|k| EventKind::parse(&k)).transpose()?,
                task_id: task.map(TaskId::new),
                since_id: since.map(EventId::new),
                limit,
                include_archived,
                ..EventFilter::default()
            };
            let list = events.list(&filter)?;
            Ok(CliOutcome::Success(serde_json::to_value(list).unwrap_or_default()))
        }
        EventsCommands::Add { kind, message, task } => {
            let kind = EventKind::parse(&kind)?;
            let event = events.append(
                kind,
                message,
                task.map(TaskId::new).as_ref(),
                None,
                &context.agent,
                None,
                now,
            )?;
            Ok(CliOutcome::Success(serde_json::to_value(event).unwrap_or_default()))
        }
        EventsCommands::Summarize { from, through, summary, task } => {
            let summary_event = events.archive_through(
                EventId::new(from),
                EventId::new(through),
                summary,
                task.map(TaskId::new).as_ref(),
                &context.agent,
                now,
            )?;
            Ok(CliOutcome::Success(serde_json::to_value(summary_event).unwrap_or_default()))
        }
    }
}

/// Dispatches one `memory` subcommand.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_memory(
    command: MemoryCommands,
    memory: &MemoryStore,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    match command {
        MemoryCommands::Set { scope, scope_id, key, value, ttl_millis } => {
            let scope = MemoryScope::parse(&scope)?;
            let entry = memory.set(scope, &scope_id, &key, &value, ttl_millis, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(entry).unwrap_or_default()))
        }
        MemoryCommands::Get { scope, scope_id, key } => {
            let scope = MemoryScope::parse(&scope)?;
            let entry = memory.get(scope, &scope_id, &key, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(entry).unwrap_or_default()))
        }
        MemoryCommands::List { scope, scope_id } => {
            let scope = MemoryScope::parse(&scope)?;
            let list = memory.list(scope, &scope_id, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(list).unwrap_or_default()))
        }
        MemoryCommands::Query { pattern, project, task } => {
            let list = memory.query(Some(&pattern), project.as_deref(), task.as_deref(), now)?;
            Ok(CliOutcome::Success(serde_json::to_value(list).unwrap_or_default()))
        }
        MemoryCommands::Delete { scope, scope_id, key } => {
            let scope = MemoryScope::parse(&scope)?;
            memory.delete(scope, &scope_id, &key)?;
            Ok(CliOutcome::SuccessEmpty)
        }
        MemoryCommands::Touch { scope, scope_id, key } => {
            let scope = MemoryScope::parse(&scope)?;
            let entry = memory.touch(scope, &scope_id, &key, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(entry).unwrap_or_default()))
        }
        MemoryCommands::Compact => Ok(CliOutcome::SuccessEmpty),
        MemoryCommands::Gc => {
            let count = memory.gc_expired(now)?;
            Ok(CliOutcome::Success(serde_json::json!({ "collected": count })))
        }
    }
}

/// Dispatches one `artifact` subcommand.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle_artifact(
    command: ArtifactCommands,
    artifacts: &ArtifactIndex,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    match command {
        ArtifactCommands::Add { kind, location, task, label } => {
            let kind = ArtifactKind::parse(&kind)?;
            let artifact =
                artifacts.add(task.map(TaskId::new).as_ref(), kind, &location, label.as_deref(), now)?;
            Ok(CliOutcome::Success(serde_json::to_value(artifact).unwrap_or_default()))
        }
        ArtifactCommands::List { task } => {
            let list = artifacts.list_for_task(&TaskId::new(task))?;
            Ok(CliOutcome::Success(serde_json::to_value(list).unwrap_or_default()))
        }
        ArtifactCommands::Get { id } => {
            let artifact = artifacts.get(ArtifactId::new(id))?;
            Ok(CliOutcome::Success(serde_json::to_value(artifact).unwrap_or_default()))
        }
    }
}

/// One parsed `--artifact kind:location[:label]` spec, ready to insert.
struct ParsedArtifact {
    kind: ArtifactKind,
    location: String,
    label: Option<String>,
}

fn parse_artifact_spec(spec: &str) -> Result<ParsedArtifact, CoreError> {
    let mut parts = spec.splitn(3, ':');
    let kind = parts
        .next()
        .ok_or_else(|| CoreError::InvalidArgument(format!("malformed --artifact spec: {spec}")))?;
    let location = parts
        .next()
        .ok_or_else(|| CoreError::InvalidArgument(format!("malformed --artifact spec: {spec}")))?
        .to_string();
    let label = parts.next().map(ToString::to_string);
    let kind = ArtifactKind::parse(kind)?;
    Ok(ParsedArtifact { kind, location, label })
}

/// Handles `push`: one atomic event append plus N artifact links.
///
/// Each `--artifact` flag is `kind:location[:label]`. The event (if any) and
/// every artifact commit inside a single transaction: a crash partway
/// through leaves neither the event nor any artifact persisted, never a
/// partial result.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] for a malformed `--artifact` spec,
/// or whatever error the underlying store operations produce.
#[allow(clippy::too_many_arguments, reason = "mirrors push's own flag count")]
pub fn handle_push(
    task_id: Option<String>,
    event_kind: Option<String>,
    message: Option<String>,
    artifact_specs: Vec<String>,
    store: &Store,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    let task_id = task_id.map(TaskId::new);
    let event_kind = event_kind.map(|kind| EventKind::parse(&kind)).transpose()?;
    let parsed_artifacts =
        artifact_specs.iter().map(|spec| parse_artifact_spec(spec)).collect::<Result<Vec<_>, _>>()?;

    let (pushed_event, pushed_artifacts) = store
        .with_tx(|tx| {
            let pushed_event = event_kind
                .map(|kind| {
                    append_event_in_tx(tx, kind, message, task_id.as_ref(), None, &context.agent, None, now)
                })
                .transpose()?;

            let mut pushed_artifacts = Vec::with_capacity(parsed_artifacts.len());
            for artifact in &parsed_artifacts {
                pushed_artifacts.push(add_artifact_in_tx(
                    tx,
                    task_id.as_ref(),
                    artifact.kind,
                    &artifact.location,
                    artifact.label.as_deref(),
                    now,
                )?);
            }
            Ok((pushed_event, pushed_artifacts))
        })
        .map_err(CoreError::from)?;

    Ok(CliOutcome::Success(serde_json::json!({
        "event": pushed_event,
        "artifacts": pushed_artifacts,
    })))
}
