//! Time source abstraction.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::Timestamp;

/// A source of the current Unix time in seconds.
///
/// The licensing engine and the spending guard read time only through this
/// trait, so expiry and the rolling window can be driven deterministically.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
