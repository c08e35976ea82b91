//! Manually advanced clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use paylane_types::{Clock, Timestamp};

/// A clock for deterministic tests.
///
/// Clones share the same time, so a test can hold one handle and advance
/// the time seen by an engine holding another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Start at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: Timestamp) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to `now`.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now(), 150);
        handle.set(10);
        assert_eq!(clock.now(), 10);
    }
}
