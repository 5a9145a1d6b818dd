// vybe-core/src/time.rs
// ============================================================================
// Module: Vybe Time Model
// Description: Wall-clock timestamp representation used across the ledger.
// Purpose: Provide a single millisecond-resolution timestamp type for
//          created_at/updated_at/expires_at/claim_expires_at fields.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Unlike a deterministic-replay engine, the ledger's TTLs and claim leases
//! are defined in terms of real wall-clock time, so [`Timestamp`] is a plain
//! milliseconds-since-epoch value rather than a logical/replay clock.

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wraps a raw millisecond value.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    ///
    /// Falls back to zero if the system clock is set before the Unix epoch,
    /// which keeps the ledger from panicking on a misconfigured clock.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(millis)
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns a timestamp offset by the given number of milliseconds.
    ///
    /// Saturates instead of overflowing so absurdly large TTLs cannot wrap
    /// around to a timestamp in the past.
    #[must_use]
    pub const fn plus_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns whether this timestamp is strictly before `other`.
    #[must_use]
    pub const fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
