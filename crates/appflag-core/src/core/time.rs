// crates/appflag-core/src/core/time.rs
// ============================================================================
// Module: appflag Time Model
// Description: Clock abstraction and TTL staleness rules.
// Purpose: Keep cache expiry deterministic and testable.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Cache timestamps are unix seconds supplied by a [`Clock`]. Production code
//! uses [`SystemClock`]; tests drive a [`ManualClock`]. Staleness is strict:
//! an entry written exactly `ttl` seconds ago is still fresh.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use time::OffsetDateTime;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current time in unix seconds.
pub trait Clock: Send + Sync {
    /// Returns the current unix timestamp in seconds.
    fn now_unix_secs(&self) -> i64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Manually advanced clock shared between clones.
#[derive(Clone, Default)]
pub struct ManualClock {
    /// Current unix seconds.
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock starting at `start` unix seconds.
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advances the clock by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock").field("now", &self.now_unix_secs()).finish()
    }
}

// ============================================================================
// SECTION: Staleness
// ============================================================================

/// Returns true when `now - timestamp > ttl` (strict greater-than).
#[must_use]
pub fn is_expired(timestamp: i64, now: i64, ttl: Duration) -> bool {
    let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(timestamp) > ttl_secs
}
