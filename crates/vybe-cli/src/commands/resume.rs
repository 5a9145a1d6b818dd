// vybe-cli/src/commands/resume.rs
// ============================================================================
// Module: Resume Subcommand Handler
// Description: Dispatches `vybe resume` onto BriefAssembler, honoring a
//              manual --focus pin before auto-selection runs.
// Purpose: Thin translation layer; all brief-assembly logic lives in
//          vybe_store_sqlite::BriefAssembler.
// Dependencies: serde_json, vybe_core, vybe_store_sqlite, crate::cli,
//               crate::context, crate::outcome
// ============================================================================

use vybe_core::CoreError;
use vybe_core::TaskId;
use vybe_core::Timestamp;
use vybe_store_sqlite::BriefAssembler;
use vybe_store_sqlite::EventLog;

use crate::cli::ResumeArgs;
use crate::context::Context;
use crate::outcome::CliOutcome;

/// Dispatches `resume`.
///
/// A `--focus` pin is applied before assembly, so it takes effect as the
/// manually-set `focus_task_id` the focus policy in §4.8 checks first.
///
/// # Errors
///
/// Returns whatever [`CoreError`] the underlying store operation produces.
pub fn handle(
    args: ResumeArgs,
    assembler: &BriefAssembler,
    events: &EventLog,
    context: &Context,
    now: Timestamp,
) -> Result<CliOutcome, CoreError> {
    if let Some(focus) = &args.focus {
        events.set_focus(&context.agent, Some(&TaskId::new(focus.clone())), args.project.as_deref(), now)?;
    }

    let brief = assembler.assemble(&context.agent, args.peek, now)?;
    Ok(CliOutcome::Success(serde_json::to_value(&brief).unwrap_or_default()))
}
