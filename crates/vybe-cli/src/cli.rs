// vybe-cli/src/cli.rs
// ============================================================================
// Module: CLI Argument Surface
// Description: clap-derived Cli/Commands/Args definitions.
// Purpose: Pure argument parsing; no handler logic lives here.
// Dependencies: clap
// ============================================================================

use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Durable per-agent working memory and task ledger.
#[derive(Debug, Parser)]
#[command(name = "vybe", version, about)]
pub struct Cli {
    /// Path to the ledger database file. Falls back to `VYBE_DB_PATH`.
    #[arg(long, global = true, env = "VYBE_DB_PATH")]
    pub db_path: Option<String>,

    /// Identity the cursor, focus, and claim fields are scoped to. Falls
    /// back to `VYBE_AGENT`, then `"default"`.
    #[arg(long, global = true, env = "VYBE_AGENT")]
    pub agent: Option<String>,

    /// Caller-supplied request identifier enabling idempotent replay.
    #[arg(long, global = true)]
    pub request_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommand surface.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Opens the database, applying any pending schema migration.
    Upgrade,
    /// Task ledger operations.
    #[command(subcommand)]
    Task(TaskCommands),
    /// Appends an event and/or links artifacts to a task in one transaction.
    Push {
        /// Task the event/artifacts are attached to.
        #[arg(long)]
        task_id: Option<String>,
        /// Event kind to append, e.g. `progress`.
        #[arg(long)]
        event_kind: Option<String>,
        /// Event message.
        #[arg(long)]
        message: Option<String>,
        /// Artifact locations to link, each as `kind:location[:label]`.
        #[arg(long = "artifact")]
        artifacts: Vec<String>,
    },
    /// Event log operations.
    #[command(subcommand)]
    Events(EventsCommands),
    /// Scoped memory store operations.
    #[command(subcommand)]
    Memory(MemoryCommands),
    /// Artifact index operations.
    #[command(subcommand)]
    Artifact(ArtifactCommands),
    /// Assembles and returns the resume brief for the current agent.
    Resume(ResumeArgs),
    /// Reports ledger health and summary counts.
    Status(StatusArgs),
    /// Reads one hook payload from stdin and dispatches it.
    Hook {
        /// Hook name, e.g. `session-start`.
        name: String,
    },
    /// Bulk-imports prior history as events.
    Ingest(IngestArgs),
    /// Prints the schema version or the command catalog.
    Schema {
        /// If set, prints the full subcommand catalog instead of just the
        /// schema version.
        #[arg(long)]
        commands: bool,
    },
    /// Point-in-time counts-only view of the ledger.
    Snapshot,
    /// Human-readable rendering of the current session's resume brief.
    SessionDigest,
    /// Recent event throughput, grouped by kind.
    LoopStats {
        /// Number of most recent events to sample.
        #[arg(long, default_value_t = 200)]
        sample: u32,
    },
}

/// `task` subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    /// Creates a task.
    Create(TaskCreateArgs),
    /// Fetches a task by ID.
    Get {
        /// Task identifier.
        id: String,
    },
    /// Lists tasks, optionally filtered.
    List {
        /// Restrict to one status.
        #[arg(long)]
        status: Option<String>,
        /// Restrict to one project.
        #[arg(long)]
        project: Option<String>,
    },
    /// Marks a task `in_progress` (pending → in_progress).
    Begin {
        /// Task identifier.
        id: String,
    },
    /// Marks a task `completed`.
    Complete {
        /// Task identifier.
        id: String,
        /// Outcome note.
        #[arg(long)]
        outcome: Option<String>,
        /// Progress summary.
        #[arg(long)]
        summary: Option<String>,
    },
    /// Sets an arbitrary status, validated against the state machine.
    SetStatus {
        /// Task identifier.
        id: String,
        /// Target status.
        status: String,
    },
    /// Sets a task's priority.
    SetPriority {
        /// Task identifier.
        id: String,
        /// New priority (higher sorts first).
        priority: i64,
    },
    /// Adds a dependency edge.
    AddDep {
        /// Dependent task.
        id: String,
        /// Task it depends on.
        depends_on: String,
    },
    /// Removes a dependency edge.
    RemoveDep {
        /// Dependent task.
        id: String,
        /// Task it no longer depends on.
        depends_on: String,
    },
    /// Deletes a task. Does not cascade to its linked artifacts or events.
    Delete {
        /// Task identifier.
        id: String,
    },
    /// Returns the best candidate without claiming it.
    Next {
        /// Restrict candidates to one project.
        #[arg(long)]
        project: Option<String>,
    },
    /// Atomically selects and claims the best candidate.
    Claim {
        /// Restrict candidates to one project.
        #[arg(long)]
        project: Option<String>,
    },
    /// Renews a held claim lease.
    Heartbeat {
        /// Task identifier.
        id: String,
    },
    /// Reclaims expired claim leases back to `pending`.
    Gc,
    /// Lists tasks a completed task directly unblocks.
    Unlocks {
        /// Task identifier.
        id: String,
    },
    /// Aggregate status counts.
    Stats,
}

/// `task create` arguments.
#[derive(Debug, Args)]
pub struct TaskCreateArgs {
    /// Task identifier; caller-supplied, must be unique.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Longer free-form description.
    #[arg(long)]
    pub description: Option<String>,
    /// Project grouping.
    #[arg(long)]
    pub project: Option<String>,
    /// Priority (higher sorts first).
    #[arg(long, default_value_t = 0)]
    pub priority: i64,
    /// Tasks this one depends on.
    #[arg(long = "after")]
    pub depends_on: Vec<String>,
}

/// `events` subcommands.
#[derive(Debug, Subcommand)]
pub enum EventsCommands {
    /// Lists events, optionally filtered.
    List {
        /// Restrict to one kind.
        #[arg(long)]
        kind: Option<String>,
        /// Restrict to one task.
        #[arg(long)]
        task: Option<String>,
        /// Only events with `id > since`.
        #[arg(long)]
        since: Option<i64>,
        /// Maximum rows returned.
        #[arg(long)]
        limit: Option<u32>,
        /// Include archived (summarized) events.
        #[arg(long)]
        include_archived: bool,
    },
    /// Appends a free-form event.
    Add {
        /// Event kind.
        kind: String,
        /// Event message.
        #[arg(long)]
        message: Option<String>,
        /// Task this event pertains to.
        #[arg(long)]
        task: Option<String>,
    },
    /// Inserts a summary event and archives a contiguous ID range.
    Summarize {
        /// Lowest event ID to archive.
        from: i64,
        /// Highest event ID to archive.
        through: i64,
        /// Summary text, recorded as the inserted event's message.
        summary: String,
        /// Task the summary event pertains to.
        #[arg(long)]
        task: Option<String>,
    },
}

/// `memory` subcommands.
#[derive(Debug, Subcommand)]
pub enum MemoryCommands {
    /// Sets (inserting or overwriting) an entry.
    Set {
        /// Scope: `global`, `project`, or `task`.
        scope: String,
        /// Scope identifier; empty string for `global`.
        #[arg(long, default_value = "")]
        scope_id: String,
        /// Entry key.
        key: String,
        /// Entry value.
        value: String,
        /// Time-to-live in milliseconds.
        #[arg(long)]
        ttl_millis: Option<i64>,
    },
    /// Fetches a single live entry.
    Get {
        /// Scope: `global`, `project`, or `task`.
        scope: String,
        /// Scope identifier.
        #[arg(long, default_value = "")]
        scope_id: String,
        /// Entry key.
        key: String,
    },
    /// Lists live entries in one scope.
    List {
        /// Scope: `global`, `project`, or `task`.
        scope: String,
        /// Scope identifier.
        #[arg(long, default_value = "")]
        scope_id: String,
    },
    /// Queries entries by key pattern (SQL `LIKE` wildcards).
    Query {
        /// Key pattern, e.g. `notes.%`.
        pattern: String,
        /// Project scope identifier to include.
        #[arg(long)]
        project: Option<String>,
        /// Task scope identifier to include.
        #[arg(long)]
        task: Option<String>,
    },
    /// Removes an entry.
    Delete {
        /// Scope: `global`, `project`, or `task`.
        scope: String,
        /// Scope identifier.
        #[arg(long, default_value = "")]
        scope_id: String,
        /// Entry key.
        key: String,
    },
    /// Extends a live entry's expiry.
    Touch {
        /// Scope: `global`, `project`, or `task`.
        scope: String,
        /// Scope identifier.
        #[arg(long, default_value = "")]
        scope_id: String,
        /// Entry key.
        key: String,
    },
    /// Reserved hook for future deduplication; a no-op today.
    Compact,
    /// Deletes every expired entry.
    Gc,
}

/// `artifact` subcommands.
#[derive(Debug, Subcommand)]
pub enum ArtifactCommands {
    /// Records an artifact.
    Add {
        /// Artifact kind: `file`, `uri`, `commit`, or `other`.
        kind: String,
        /// Path, URI, or ref.
        location: String,
        /// Task to link this artifact to.
        #[arg(long)]
        task: Option<String>,
        /// Short human-readable label.
        #[arg(long)]
        label: Option<String>,
    },
    /// Lists artifacts linked to a task.
    List {
        /// Task identifier.
        task: String,
    },
    /// Fetches a single artifact by ID.
    Get {
        /// Artifact identifier.
        id: i64,
    },
}

/// `resume` arguments.
#[derive(Debug, Args)]
pub struct ResumeArgs {
    /// Assemble the brief without advancing the cursor or persisting an
    /// auto-selected focus task.
    #[arg(long)]
    pub peek: bool,
    /// Manually pins the focus task.
    #[arg(long)]
    pub focus: Option<String>,
    /// Scopes auto-selection to one project.
    #[arg(long)]
    pub project: Option<String>,
}

/// `status` arguments.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Exit non-zero if the database cannot be opened or migrated.
    #[arg(long)]
    pub check: bool,
}

/// `ingest history` arguments.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Source of history to import.
    #[command(subcommand)]
    pub source: IngestSource,
}

/// What `ingest` imports.
#[derive(Debug, Subcommand)]
pub enum IngestSource {
    /// Imports a JSON Lines file of prior conversation turns as
    /// `user_prompt` events.
    History {
        /// Path to a `.jsonl` file, one `{"prompt": "..."}` object per line.
        #[arg(long)]
        file: String,
    },
}
