// crates/bankws-client/src/clock.rs
// ============================================================================
// Module: Clock
// Description: Time source for request timestamps and request ids.
// Purpose: Let tests pin the date that drives the daily request-id reset.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Requests carry the local wall-clock time. [`SystemClock`] reads it with
//! the local UTC offset when the platform can tell it, and with a configured
//! fallback offset otherwise. The date of that local time drives the daily
//! request id reset, so the fallback matters around midnight.
//! [`FixedClock`] returns a settable instant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use time::OffsetDateTime;
use time::UtcOffset;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant with its UTC offset.
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Offset applied when the local offset is unknown.
    fallback: UtcOffset,
}

impl SystemClock {
    /// Wall clock falling back to UTC.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fallback: UtcOffset::UTC,
        }
    }

    /// Wall clock falling back to `offset`.
    #[must_use]
    pub const fn with_fallback_offset(offset: UtcOffset) -> Self {
        Self {
            fallback: offset,
        }
    }

    /// Picks the local time when known, else `utc` shifted to the fallback offset.
    fn resolve(&self, local: Option<OffsetDateTime>, utc: OffsetDateTime) -> OffsetDateTime {
        local.unwrap_or_else(|| utc.to_offset(self.fallback))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        self.resolve(OffsetDateTime::now_local().ok(), OffsetDateTime::now_utc())
    }
}

/// Clock returning a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    /// Current instant.
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    /// Creates a clock stopped at `now`.
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
