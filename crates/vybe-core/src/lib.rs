// vybe-core/src/lib.rs
// ============================================================================
// Crate: vybe-core
// Description: Storage-agnostic domain types and business rules for the
//              Vybe working-memory and task-ledger.
// Purpose: Hold everything that does not need SQL: identifiers, the task
//          state machine, ordering, error taxonomy, and the CLI envelope
//          shape. `vybe-store-sqlite` owns every SQL statement; it depends
//          on this crate, never the other way around.
// ============================================================================

//! Domain types and pure business rules for the Vybe ledger.
//!
//! This crate has no knowledge of SQLite, the filesystem, or the CLI. It
//! exists so the state machine, ordering, and error taxonomy can be unit
//! tested without standing up a database, and so `vybe-cli` and
//! `vybe-store-sqlite` agree on one definition of each domain type.

pub mod agent;
pub mod artifact;
pub mod brief;
pub mod envelope;
pub mod error;
pub mod event;
pub mod idempotency;
pub mod ids;
pub mod memory;
pub mod task;
pub mod time;

pub use agent::AgentState;
pub use artifact::Artifact;
pub use artifact::ArtifactKind;
pub use brief::Brief;
pub use brief::render_additional_context;
pub use envelope::Envelope;
pub use error::CoreError;
pub use error::CoreResult;
pub use event::Event;
pub use event::EventFilter;
pub use event::EventKind;
pub use event::Order;
pub use idempotency::IdempotencyRecord;
pub use ids::AgentName;
pub use ids::ArtifactId;
pub use ids::EventId;
pub use ids::ProjectId;
pub use ids::TaskId;
pub use memory::MemoryEntry;
pub use memory::MemoryScope;
pub use task::OrderingKey;
pub use task::Task;
pub use task::TaskStatus;
pub use task::TransitionTrigger;
pub use task::select_best;
pub use task::validate_transition;
pub use time::Timestamp;
