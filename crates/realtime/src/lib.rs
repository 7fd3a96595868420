//! Realtime layer for Fieldbook
//!
//! This crate distributes events to connected users:
//! - EventBus: connection registry, per-user listeners, broadcast
//! - Event / NewEvent: immutable event records and their stored form
//! - BusChangeNotifier: turns document store changes into events
//! - Sweeper: optional background cleanup of idle connections and old events
//!
//! Events are persisted through the engine's DocumentStore; delivery to live
//! listeners does not depend on persistence succeeding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod connection;
pub mod event;
pub mod notifier;
pub mod sweeper;

pub use bus::{BusConfig, EventBus, Listener, Subscription, WeakEventBus};
pub use connection::{Connection, ConnectionId};
pub use event::{Event, EventType, NewEvent};
pub use notifier::{BusChangeNotifier, OWNER_FIELD};
pub use sweeper::Sweeper;
