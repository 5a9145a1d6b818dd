// vybe-store-sqlite/src/lib.rs
// ============================================================================
// Crate: vybe-store-sqlite
// Description: Durable SQLite-backed storage for the Vybe ledger.
// Purpose: Own every SQL statement and connection lifecycle decision behind
//          a small set of component stores, each mirroring one vybe_core
//          domain module.
// ============================================================================

//! `SQLite`-backed persistence for the Vybe ledger.
//!
//! [`Store`] owns the connection; the five component stores
//! ([`TaskStore`], [`EventLog`], [`MemoryStore`], [`ArtifactIndex`],
//! [`IdempotencyLog`]) and the [`BriefAssembler`] each hold a cheap clone of
//! it and translate `vybe_core` domain operations into SQL.

pub mod artifacts;
pub mod brief;
pub mod error;
pub mod events;
pub mod idempotency;
pub mod memory;
pub mod store;
pub mod tasks;

pub use artifacts::ArtifactIndex;
pub use artifacts::add_in_tx as add_artifact_in_tx;
pub use brief::BriefAssembler;
pub use error::StoreError;
pub use error::StoreResult;
pub use events::EventLog;
pub use events::append_in_tx as append_event_in_tx;
pub use idempotency::IdempotencyLog;
pub use memory::MemoryStore;
pub use store::Store;
pub use tasks::DEFAULT_CLAIM_LEASE_MILLIS;
pub use tasks::TaskStats;
pub use tasks::TaskStore;
