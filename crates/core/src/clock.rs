//! Time sources
//!
//! Every component that stamps or ages data reads time through [`Clock`]
//! so sweeps and retention can be driven deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::timestamp::Timestamp;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `SystemTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced clock
///
/// Cloning shares the underlying time, so a test can keep one handle and
/// hand another to the store or bus.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            micros: Arc::new(AtomicU64::new(start.as_micros())),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, to: Timestamp) {
        self.micros.store(to.as_micros(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;

/// Default shared wall clock
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
