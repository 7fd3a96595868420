//! Identifier generation
//!
//! Ids combine the creation time in milliseconds, a process-wide monotonic
//! counter and a random suffix:
//!
//! ```text
//! 0190c3f2a1b4-0007-k3x9q2mz
//! └─ millis ─┘ └ctr┘ └ rand ┘
//! ```
//!
//! Two ids minted in the same millisecond differ in the counter, and two
//! processes sharing a backend differ in the suffix.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::timestamp::Timestamp;

const SUFFIX_LEN: usize = 8;

/// Monotonic, collision-resistant id source
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    /// Create a generator with its counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new id stamped with `now`
    pub fn next_id(&self, now: Timestamp) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{:012x}-{:04x}-{}", now.as_millis(), seq & 0xffff, suffix)
    }
}
