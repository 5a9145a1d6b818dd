// vybe-cli/src/context.rs
// ============================================================================
// Module: CLI Context Resolution
// Description: Resolves --db-path/--agent against flags and env vars.
// Purpose: Centralize the flag → env → default fallback chain.
// Dependencies: vybe_core
// ============================================================================

use std::path::PathBuf;

use vybe_core::AgentName;
use vybe_core::CoreError;

/// Default agent identity when neither `--agent` nor `VYBE_AGENT` is set.
const DEFAULT_AGENT: &str = "default";

/// Resolved global configuration for one CLI invocation.
pub struct Context {
    /// Path to the ledger database file.
    pub db_path: PathBuf,
    /// Agent identity scoping cursor, focus, and claim ownership.
    pub agent: AgentName,
    /// Caller-supplied idempotency key, if any.
    pub request_id: Option<String>,
}

impl Context {
    /// Resolves a [`Context`] from parsed CLI flags, falling back to the
    /// `VYBE_DB_PATH`/`VYBE_AGENT` environment variables and finally to
    /// `"default"` for the agent name.
    ///
    /// clap's `env = "..."` attribute on the flag already performs this
    /// fallback for `--db-path`/`--agent` before `Context` ever sees the
    /// value, so this only supplies the final default for the agent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if no database path was
    /// resolved from either the flag or the environment.
    pub fn resolve(
        db_path: Option<String>,
        agent: Option<String>,
        request_id: Option<String>,
    ) -> Result<Self, CoreError> {
        let db_path = db_path.ok_or_else(|| {
            CoreError::InvalidArgument(
                "--db-path is required (or set VYBE_DB_PATH)".to_string(),
            )
        })?;
        let agent = agent.unwrap_or_else(|| DEFAULT_AGENT.to_string());
        Ok(Self { db_path: PathBuf::from(db_path), agent: AgentName::new(agent), request_id })
    }
}
