// vybe-cli/src/main.rs
// ============================================================================
// Binary: vybe
// Description: Entry point — parses arguments, opens the ledger, dispatches
//              to the matching command handler, and prints the envelope.
// Purpose: Wire clap parsing, tracing, Store construction, the component
//          stores, and idempotent replay together into one process.
// Dependencies: clap, tracing, tracing-subscriber, vybe_core,
//               vybe_store_sqlite, crate::{cli,context,outcome,commands}
// ============================================================================

mod cli;
mod commands;
mod context;
mod outcome;

use std::process::ExitCode;

use clap::Parser;
use vybe_core::CoreError;
use vybe_core::Timestamp;
use vybe_store_sqlite::ArtifactIndex;
use vybe_store_sqlite::BriefAssembler;
use vybe_store_sqlite::EventLog;
use vybe_store_sqlite::IdempotencyLog;
use vybe_store_sqlite::MemoryStore;
use vybe_store_sqlite::Store;
use vybe_store_sqlite::TaskStore;

use cli::Cli;
use cli::Commands;
use context::Context;
use outcome::CliOutcome;

fn main() -> ExitCode {
    init_tracing();
    let args = Cli::parse();

    let context = match Context::resolve(args.db_path, args.agent, args.request_id) {
        Ok(context) => context,
        Err(err) => return outcome::emit(Err(err)),
    };

    let store = match Store::open(&context.db_path) {
        Ok(store) => store,
        Err(err) => return outcome::emit(Err(CoreError::from(err))),
    };

    let result = dispatch(args.command, &store, &context);
    outcome::emit(result)
}

/// Initializes the stderr `tracing` subscriber, honoring `VYBE_LOG` then
/// `RUST_LOG`, defaulting to `warn`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("VYBE_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Builds the component stores and routes `command` to its handler,
/// transparently wrapping the call in idempotent replay when both the
/// command and the invocation carry a `request_id`.
fn dispatch(command: Commands, store: &Store, context: &Context) -> Result<CliOutcome, CoreError> {
    let now = Timestamp::now();
    let tasks = TaskStore::new(store.clone());
    let events = EventLog::new(store.clone());
    let memory = MemoryStore::new(store.clone());
    let artifacts = ArtifactIndex::new(store.clone());
    let assembler = BriefAssembler::new(store.clone());
    let idempotency = IdempotencyLog::new(store.clone());

    let command_name = idempotency_command_name(&command);

    let run = move || -> Result<CliOutcome, CoreError> {
        match command {
            Commands::Upgrade => commands::misc::handle_upgrade(),
            Commands::Task(sub) => commands::task::handle(sub, &tasks, context, now),
            Commands::Push { task_id, event_kind, message, artifacts: artifact_specs } => {
                commands::ledger::handle_push(
                    task_id,
                    event_kind,
                    message,
                    artifact_specs,
                    store,
                    context,
                    now,
                )
            }
            Commands::Events(sub) => commands::ledger::handle_events(sub, &events, context, now),
            Commands::Memory(sub) => commands::ledger::handle_memory(sub, &memory, now),
            Commands::Artifact(sub) => commands::ledger::handle_artifact(sub, &artifacts, now),
            Commands::Resume(args) => commands::resume::handle(args, &assembler, &events, context, now),
            Commands::Status(args) => commands::misc::handle_status(args, &tasks, &events),
            Commands::Hook { name } => {
                let mut stdin = std::io::stdin();
                commands::hook::handle(&name, &mut stdin, &assembler, &events, &memory, context, now)
            }
            Commands::Ingest(args) => commands::misc::handle_ingest(args, &events, context, now),
            Commands::Schema { commands: show_commands } => commands::misc::handle_schema(show_commands),
            Commands::Snapshot => commands::misc::handle_snapshot(&tasks, &events, &memory, &artifacts, now),
            Commands::SessionDigest => commands::misc::handle_session_digest(&assembler, context, now),
            Commands::LoopStats { sample } => commands::misc::handle_loop_stats(sample, &events),
        }
    };

    match (command_name, context.request_id.as_deref()) {
        (Some(command_name), Some(request_id)) => {
            let value = idempotency.with_replay(&context.agent, request_id, command_name, now, || {
                run().map(|outcome| outcome::to_replay_value(&outcome))
            })?;
            Ok(outcome::from_replay_value(value))
        }
        _ => run(),
    }
}

/// Returns a stable, field-free identifier for the idempotency log's
/// `command` column, or `None` for commands that never accept a
/// `request_id`-tracked replay (pure reads and the hook adapter, which
/// drivers do not supply a request ID for).
fn idempotency_command_name(command: &Commands) -> Option<&'static str> {
    use cli::ArtifactCommands;
    use cli::EventsCommands;
    use cli::MemoryCommands;
    use cli::TaskCommands;

    match command {
        Commands::Task(TaskCommands::Create(_)) => Some("task.create"),
        Commands::Task(TaskCommands::Begin { .. }) => Some("task.begin"),
        Commands::Task(TaskCommands::Complete { .. }) => Some("task.complete"),
        Commands::Task(TaskCommands::SetStatus { .. }) => Some("task.set_status"),
        Commands::Task(TaskCommands::SetPriority { .. }) => Some("task.set_priority"),
        Commands::Task(TaskCommands::AddDep { .. }) => Some("task.add_dep"),
        Commands::Task(TaskCommands::RemoveDep { .. }) => Some("task.remove_dep"),
        Commands::Task(TaskCommands::Delete { .. }) => Some("task.delete"),
        Commands::Task(TaskCommands::Claim { .. }) => Some("task.claim"),
        Commands::Task(TaskCommands::Heartbeat { .. }) => Some("task.heartbeat"),
        Commands::Task(TaskCommands::Gc) => Some("task.gc"),
        Commands::Push { .. } => Some("push"),
        Commands::Events(EventsCommands::Add { .. }) => Some("events.add"),
        Commands::Events(EventsCommands::Summarize { .. }) => Some("events.summarize"),
        Commands::Memory(MemoryCommands::Set { .. }) => Some("memory.set"),
        Commands::Memory(MemoryCommands::Delete { .. }) => Some("memory.delete"),
        Commands::Memory(MemoryCommands::Touch { .. }) => Some("memory.touch"),
        Commands::Memory(MemoryCommands::Gc) => Some("memory.gc"),
        Commands::Artifact(ArtifactCommands::Add { .. }) => Some("artifact.add"),
        Commands::Ingest(_) => Some("ingest.history"),
        _ => None,
    }
}
