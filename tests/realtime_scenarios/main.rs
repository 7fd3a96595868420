//! Realtime Scenario Tests
//!
//! Event bus behaviour through the public facade:
//! - delivery: fan-out, exactly-once, listener isolation, unsubscribe
//! - presence: connections, heartbeats, idle cleanup
//! - retention: batched purge of expired events, history
//! - notifications: document writes turned into events

#[path = "../common/mod.rs"]
mod common;

mod delivery;
mod notifications;
mod retention;
