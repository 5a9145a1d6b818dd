// vybe-cli/src/commands/task.rs
// ============================================================================
// Module: Task Subcommand Handlers
// Description: Dispatches `vybe task ...` onto vybe_store_sqlite::TaskStore.
// Purpose: Translate parsed CLI args into core calls and JSON payloads.
// Dependencies: serde_json, vybe_core, vybe_store_sqlite, crate::cli,
//               crate::context, crate::outcome
// ============================================================================

use vybe_core::CoreError;
use vybe_core::ProjectId;
use vybe_core::TaskId;
use vybe_core::TaskStatus;
use vybe_core::Timestamp;
use vybe_core::TransitionTrigger;
use vybe_store_sqlite::TaskStore;

use crate::cli::TaskCommands;
use crate::cli::TaskCreateArgs;
use crate::context::Context;
use crate::outcome::CliOutcome;

/// Dispatches one `task` subcommand.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle(
    command: TaskCommands,
    tasks: &TaskStore,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    match command {
        TaskCommands::Create(args) => create(args, tasks, now),
        TaskCommands::Get { id } => {
            let task = tasks.get(&TaskId::new(id))?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::List { status, project } => {
            let status = status.map(|s| TaskStatus::parse(&s)).transpose()?;
            let project = project.map(ProjectId::new);
            let list = tasks.list(status, project.as_ref())?;
            Ok(CliOutcome::Success(serde_json::to_value(list).unwrap_or_default()))
        }
        TaskCommands::Begin { id } => {
            let task = tasks.set_status(
                &TaskId::new(id),
                TaskStatus::InProgress,
                TransitionTrigger::Begin,
                None,
                None,
                Some(&context.agent),
                now,
            )?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::Complete { id, outcome, summary } => {
            let task = tasks.set_status(
                &TaskId::new(id),
                TaskStatus::Completed,
                TransitionTrigger::Complete,
                outcome,
                summary,
                None,
                now,
            )?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::SetStatus { id, status } => {
            let status = TaskStatus::parse(&status)?;
            let task = tasks.set_status(
                &TaskId::new(id),
                status,
                TransitionTrigger::SetStatus,
                None,
                None,
                None,
                now,
            )?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::SetPriority { id, priority } => {
            let task = tasks.set_priority(&TaskId::new(id), priority, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::AddDep { id, depends_on } => {
            let task = tasks.add_dependency(&TaskId::new(id), &TaskId::new(depends_on), now)?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::RemoveDep { id, depends_on } => {
            let task = tasks.remove_dependency(&TaskId::new(id), &TaskId::new(depends_on), now)?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::Delete { id } => {
            tasks.delete(&TaskId::new(id))?;
            Ok(CliOutcome::SuccessEmpty)
        }
        TaskCommands::Next { project } => {
            let project = project.map(ProjectId::new);
            let task = tasks.next(project.as_ref())?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::Claim { project } => {
            let project = project.map(ProjectId::new);
            let task = tasks.claim(&context.agent, project.as_ref(), now)?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::Heartbeat { id } => {
            let task = tasks.heartbeat(&TaskId::new(id), &context.agent, now)?;
            Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
        }
        TaskCommands::Gc => {
            let released = tasks.reclaim_expired_leases(now)?;
            Ok(CliOutcome::Success(serde_json::json!({ "released": released })))
        }
        TaskCommands::Unlocks { id } => {
            let unlocked = tasks.unlocks(&TaskId::new(id))?;
            Ok(CliOutcome::Success(serde_json::to_value(unlocked).unwrap_or_default()))
        }
        TaskCommands::Stats => {
            let stats = tasks.stats()?;
            Ok(CliOutcome::Success(serde_json::to_value(stats).unwrap_or_default()))
        }
    }
}

fn create(args: TaskCreateArgs, tasks: &TaskStore, now: Timestamp) -> Result<CliOutcome, CoreError> {
    let depends_on: Vec<TaskId> = args.depends_on.into_iter().map(TaskId::new).collect();
    let task = tasks.create(
        TaskId::new(args.id),
        args.title,
        args.description,
        args.project.map(ProjectId::new),
        args.priority,
        &depends_on,
        now,
    )?;
    Ok(CliOutcome::Success(serde_json::to_value(task).unwrap_or_default()))
}
