// vybe-cli/src/outcome.rs
// ============================================================================
// Module: CLI Outcome and Output Formatting
// Description: The value every command handler returns, and the one place
//              that turns it into stdout JSON plus an exit code.
// Purpose: Keep handlers free of print!/println! entirely.
// Dependencies: serde_json, vybe_core
// ============================================================================

use std::process::ExitCode;

use serde_json::Value;
use vybe_core::CoreError;
use vybe_core::Envelope;

/// What a command handler hands back to the dispatcher.
pub enum CliOutcome {
    /// A successful command, carrying its JSON payload.
    Success(Value),
    /// A successful command with no payload.
    SuccessEmpty,
    /// A hook `session-start` response, which additionally carries
    /// `hookSpecificOutput.additionalContext` alongside `data`.
    HookSessionStart { data: Value, additional_context: String },
}

/// Encodes a [`CliOutcome`] as a single JSON [`Value`] suitable for
/// [`vybe_store_sqlite::IdempotencyLog::with_replay`] to cache and later
/// hand back verbatim.
#[must_use]
pub fn to_replay_value(outcome: &CliOutcome) -> Value {
    match outcome {
        CliOutcome::Success(data) => serde_json::json!({ "kind": "success", "data": data }),
        CliOutcome::SuccessEmpty => serde_json::json!({ "kind": "success_empty" }),
        CliOutcome::HookSessionStart { data, additional_context } => {
            serde_json::json!({
                "kind": "hook_session_start",
                "data": data,
                "additional_context": additional_context,
            })
        }
    }
}

/// Decodes a [`Value`] produced by [`to_replay_value`] back into a
/// [`CliOutcome`]. A value in an unrecognized shape degrades to
/// [`CliOutcome::Success`] carrying the raw value rather than failing the
/// replay outright.
#[must_use]
pub fn from_replay_value(value: Value) -> CliOutcome {
    let kind = value.get("kind").and_then(Value::as_str).map(str::to_string);
    match kind.as_deref() {
        Some("success_empty") => CliOutcome::SuccessEmpty,
        Some("hook_session_start") => {
            let additional_context = value
                .get("additional_context")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let data = value.get("data").cloned().unwrap_or(Value::Null);
            CliOutcome::HookSessionStart { data, additional_context }
        }
        Some("success") => CliOutcome::Success(value.get("data").cloned().unwrap_or(Value::Null)),
        _ => CliOutcome::Success(value),
    }
}

/// Prints the envelope for `result` to stdout and returns the process exit
/// code: 0 on success or a validation-shaped failure, 1 on an internal
/// failure.
#[allow(clippy::print_stdout, reason = "the envelope is the CLI's sole output contract")]
pub fn emit(result: Result<CliOutcome, CoreError>) -> ExitCode {
    let (envelope, exit_internal_failure) = match result {
        Ok(CliOutcome::Success(data)) => (Envelope::success(data), false),
        Ok(CliOutcome::SuccessEmpty) => (Envelope::success_empty(), false),
        Ok(CliOutcome::HookSessionStart { data, additional_context }) => {
            let mut envelope = Envelope::success(data);
            if let Some(object) = envelope.data.as_mut().and_then(Value::as_object_mut) {
                object.insert(
                    "hookSpecificOutput".to_string(),
                    serde_json::json!({ "additionalContext": additional_context }),
                );
            }
            (envelope, false)
        }
        Err(err) => {
            let exit_internal_failure = matches!(err, CoreError::Internal(_));
            (Envelope::failure(&err), exit_internal_failure)
        }
    };

    let line = serde_json::to_string(&envelope).unwrap_or_else(|_| {
        r#"{"success":false,"error":"failed to serialize response"}"#.to_string()
    });
    println!("{line}");

    if exit_internal_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
