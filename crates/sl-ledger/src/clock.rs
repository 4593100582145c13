//! Time sources for the ledger
//!
//! The ledger reads the clock exactly once per operation. Production code
//! uses [`SystemClock`]; tests inject a [`ManualClock`] so "now" is
//! deterministic without sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use chrono::Utc;

/// Source of the current time in Unix seconds (block-time equivalent)
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Settable clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move time forward (or backward, for negative values); returns the new time
    pub fn advance(&self, secs: i64) -> i64 {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(500), 1_500);
        assert_eq!(clock.now(), 1_500);
        clock.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn test_system_clock_is_unix_seconds() {
        let now = SystemClock.now();
        // Sanity bound: after 2020-01-01
        assert!(now > 1_577_836_800);
    }
}
