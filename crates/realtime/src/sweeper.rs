//! Background sweep task
//!
//! [`Sweeper`] runs in a background thread and periodically removes idle
//! connections and purges expired events through the bus's normal sweep
//! entry points, so the work it does is identical to the opportunistic
//! sweeps done by `connect` and `broadcast`.
//!
//! # Design Notes
//!
//! - Runs in its own thread, never blocks callers
//! - Graceful shutdown via atomic flag, checked at least every 100ms
//! - Does not sweep immediately on start
//! - Intervals below [`MIN_INTERVAL`] are raised to it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::EventBus;

/// Shortest sweep interval
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Background sweep task
///
/// # Example
///
/// ```ignore
/// let sweeper = Sweeper::new(bus.clone(), Duration::from_secs(60));
/// let handle = sweeper.start();
///
/// // ... use the bus ...
///
/// sweeper.shutdown();
/// handle.join().unwrap();
/// ```
pub struct Sweeper {
    bus: EventBus,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Sweeper {
    /// Create a sweeper for `bus` running every `interval`
    pub fn new(bus: EventBus, interval: Duration) -> Self {
        Self {
            bus,
            interval: interval.max(MIN_INTERVAL),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Time between sweeps
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the background thread
    ///
    /// The thread runs until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        thread::spawn(move || {
            let tick = Duration::from_millis(100).min(interval);
            while !shutdown.load(Ordering::Relaxed) {
                let mut elapsed = Duration::ZERO;
                while elapsed < interval {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(tick);
                    elapsed += tick;
                }

                let connections = bus.sweep_connections();
                match bus.purge_expired_events() {
                    Ok(events) => debug!(
                        target: "fieldbook::bus",
                        connections,
                        events,
                        "background sweep"
                    ),
                    Err(e) => warn!(target: "fieldbook::bus", error = %e, "background purge failed"),
                }
            }
        })
    }

    /// Signal shutdown; the thread exits on its next tick
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("interval", &self.interval)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
