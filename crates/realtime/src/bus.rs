//! Realtime event bus
//!
//! The bus owns three pieces of state:
//!
//! - a registry of live connections per user (presence)
//! - a listener table `user_id → [callback]` (pub/sub)
//! - the persisted event log, stored as documents in one collection
//!
//! ## Delivery
//!
//! `broadcast` persists the event, then invokes every listener of every
//! recipient exactly once, on the calling thread. Listeners are invoked
//! outside all bus locks, so a listener may subscribe, unsubscribe or
//! broadcast. A panicking listener is logged and skipped; the remaining
//! listeners still run. Order across listeners is unspecified.
//!
//! Persisting is best effort: a store failure is logged and the event is
//! still delivered to live listeners.
//!
//! ## Cleanup
//!
//! Idle connections are swept on every `connect`. Expired events are purged
//! in bounded batches, opportunistically from `broadcast` (at most once per
//! sweep interval) and from the optional [`Sweeper`](crate::Sweeper).
//!
//! Purge and history only see documents that decode as events. Anything else
//! found in the events collection is skipped with a warning and left alone.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fieldbook_core::{Document, Error, Result, Timestamp, Value};
use fieldbook_engine::{evaluate, Direction, DocumentStore, Operator, Query};
use fieldbook_storage::validate_collection_name;

use crate::connection::{Connection, ConnectionId, Registry};
use crate::event::{Event, NewEvent};

/// Callback invoked for each event delivered to a user
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Event bus settings
///
/// All fields have defaults, so a partial `[realtime]` table is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Connections idle longer than this are removed (milliseconds)
    pub inactivity_timeout_ms: u64,
    /// Events older than this are purged (milliseconds)
    pub event_retention_ms: u64,
    /// Maximum events deleted per purge
    pub cleanup_batch_size: usize,
    /// Collection holding persisted events
    pub events_collection: String,
    /// Background sweep period (milliseconds); 0 disables the sweeper
    ///
    /// Also the minimum gap between opportunistic purges in `broadcast`.
    pub sweep_interval_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            inactivity_timeout_ms: 5 * 60 * 1000,
            event_retention_ms: 7 * 24 * 60 * 60 * 1000,
            cleanup_batch_size: 100,
            events_collection: "events".to_string(),
            sweep_interval_ms: 60 * 1000,
        }
    }
}

impl BusConfig {
    /// Inactivity threshold
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    /// Event retention window
    pub fn event_retention(&self) -> Duration {
        Duration::from_millis(self.event_retention_ms)
    }

    /// Background sweep period, or `None` if disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_ms > 0).then(|| Duration::from_millis(self.sweep_interval_ms))
    }

    /// Reject settings the bus cannot run with
    ///
    /// # Errors
    ///
    /// `Error::Validation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.inactivity_timeout_ms == 0 {
            return Err(Error::validation("inactivity_timeout_ms must be > 0"));
        }
        if self.event_retention_ms == 0 {
            return Err(Error::validation("event_retention_ms must be > 0"));
        }
        if self.cleanup_batch_size == 0 {
            return Err(Error::validation("cleanup_batch_size must be > 0"));
        }
        validate_collection_name(&self.events_collection)
    }
}

struct BusInner {
    store: Arc<DocumentStore>,
    config: BusConfig,
    registry: Mutex<Registry>,
    listeners: RwLock<HashMap<String, Vec<(u64, Listener)>>>,
    next_subscription: AtomicU64,
    last_purge: Mutex<Option<Timestamp>>,
}

/// Connection registry, pub/sub fan-out and event log
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// Non-owning handle to an [`EventBus`]
#[derive(Clone)]
pub struct WeakEventBus {
    inner: Weak<BusInner>,
}

impl WeakEventBus {
    /// The bus, if it is still alive
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

/// Handle to one registered listener
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "keep the Subscription to be able to unsubscribe"]
pub struct Subscription {
    bus: Weak<BusInner>,
    user_id: String,
    id: u64,
}

impl Subscription {
    /// User this listener is registered for
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Remove exactly this listener
    ///
    /// Returns `false` if it was already gone or the bus was dropped.
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };
        let mut listeners = inner.listeners.write();
        let Some(subs) = listeners.get_mut(&self.user_id) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(id, _)| *id != self.id);
        let removed = subs.len() < before;
        if subs.is_empty() {
            listeners.remove(&self.user_id);
        }
        removed
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("user_id", &self.user_id)
            .field("id", &self.id)
            .finish()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.inner.config)
            .field("connections", &self.connection_count())
            .field("subscribed_users", &self.inner.listeners.read().len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus persisting events through `store`
    ///
    /// # Errors
    ///
    /// `Error::Validation` if `config` is invalid.
    pub fn new(store: Arc<DocumentStore>, config: BusConfig) -> Result<Self> {
        config.validate()?;
        Ok(EventBus {
            inner: Arc::new(BusInner {
                store,
                config,
                registry: Mutex::new(Registry::default()),
                listeners: RwLock::new(HashMap::new()),
                next_subscription: AtomicU64::new(1),
                last_purge: Mutex::new(None),
            }),
        })
    }

    /// Bus settings
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Store events are persisted through
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.inner.store
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn now(&self) -> Timestamp {
        self.inner.store.now()
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Register a connection for `user_id`
    ///
    /// Sweeps idle connections first.
    pub fn connect(&self, user_id: &str) -> ConnectionId {
        self.sweep_connections();
        let id = self.inner.registry.lock().insert(user_id, self.now());
        debug!(target: "fieldbook::bus", user_id, connection = %id, "connected");
        id
    }

    /// Refresh a connection's `last_seen`; `false` if it is unknown
    pub fn heartbeat(&self, connection: ConnectionId) -> bool {
        self.inner.registry.lock().touch(&connection, self.now())
    }

    /// Remove a connection; `false` if it was already gone
    pub fn disconnect(&self, connection: ConnectionId) -> bool {
        let removed = self.inner.registry.lock().remove(&connection);
        if let Some(conn) = &removed {
            debug!(target: "fieldbook::bus", user_id = %conn.user_id, connection = %conn.id, "disconnected");
        }
        removed.is_some()
    }

    /// True if the user has a connection that is not idle
    pub fn is_online(&self, user_id: &str) -> bool {
        let now = self.now();
        let timeout = self.inner.config.inactivity_timeout();
        self.inner
            .registry
            .lock()
            .for_user(user_id)
            .iter()
            .any(|c| c.is_active(now, timeout))
    }

    /// Registered connections of a user, oldest first
    pub fn connections_for(&self, user_id: &str) -> Vec<Connection> {
        self.inner.registry.lock().for_user(user_id)
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Remove connections idle longer than the inactivity timeout
    pub fn sweep_connections(&self) -> usize {
        let now = self.now();
        let removed = self
            .inner
            .registry
            .lock()
            .sweep(now, self.inner.config.inactivity_timeout());
        for conn in &removed {
            debug!(
                target: "fieldbook::bus",
                user_id = %conn.user_id,
                connection = %conn.id,
                last_seen = %conn.last_seen,
                "idle connection removed"
            );
        }
        removed.len()
    }

    // ========================================================================
    // Pub/sub
    // ========================================================================

    /// Register `callback` for events addressed to `user_id`
    pub fn subscribe<F>(&self, user_id: &str, callback: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        Subscription {
            bus: Arc::downgrade(&self.inner),
            user_id: user_id.to_string(),
            id,
        }
    }

    /// Number of listeners registered for a user
    pub fn listener_count(&self, user_id: &str) -> usize {
        self.inner
            .listeners
            .read()
            .get(user_id)
            .map_or(0, Vec::len)
    }

    /// Assign id and timestamp, persist, and deliver an event
    ///
    /// Never fails: persistence errors are logged and delivery proceeds.
    pub fn broadcast(&self, new_event: NewEvent) -> Event {
        let now = self.now();
        let broadcast_to = new_event.recipients();
        let event = Event {
            id: self.inner.store.new_id(),
            event_type: new_event.event_type,
            user_id: new_event.user_id,
            data: new_event.data,
            timestamp: now,
            broadcast_to,
        };

        if let Err(e) = self.inner.store.create_with_id(
            &self.inner.config.events_collection,
            &event.id,
            event.to_fields(),
        ) {
            warn!(
                target: "fieldbook::bus",
                event_id = %event.id,
                error = %e,
                "failed to persist event; delivering anyway"
            );
        }

        let delivered = self.deliver(&event);
        debug!(
            target: "fieldbook::bus",
            event_id = %event.id,
            event_type = %event.event_type,
            recipients = event.broadcast_to.len(),
            delivered,
            "event broadcast"
        );

        self.purge_if_due(now);
        event
    }

    fn deliver(&self, event: &Event) -> usize {
        let targets: Vec<Listener> = {
            let listeners = self.inner.listeners.read();
            event
                .broadcast_to
                .iter()
                .filter_map(|user| listeners.get(user))
                .flat_map(|subs| subs.iter().map(|(_, l)| Arc::clone(l)))
                .collect()
        };

        let mut delivered = 0;
        for listener in targets {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => warn!(
                    target: "fieldbook::bus",
                    event_id = %event.id,
                    panic = panic_message(&*panic),
                    "listener panicked"
                ),
            }
        }
        delivered
    }

    // ========================================================================
    // Event log
    // ========================================================================

    /// Delete up to `cleanup_batch_size` events older than the retention window
    ///
    /// Oldest events go first. Returns how many were deleted.
    pub fn purge_expired_events(&self) -> Result<usize> {
        let config = &self.inner.config;
        let cutoff = self.now().saturating_sub(config.event_retention());
        let query = Query::new(config.events_collection.as_str())
            .filter("timestamp", Operator::Lt, Value::Timestamp(cutoff))
            .order_by("timestamp", Direction::Asc)
            .limit(config.cleanup_batch_size);

        let expired = evaluate(&query, self.event_log()?)?;
        if expired.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = expired.into_iter().map(|d| d.id).collect();
        let removed = self
            .inner
            .store
            .delete_many(&config.events_collection, &ids)?;
        debug!(target: "fieldbook::bus", removed, cutoff = %cutoff, "expired events purged");
        Ok(removed)
    }

    fn purge_if_due(&self, now: Timestamp) {
        let interval = Duration::from_millis(self.inner.config.sweep_interval_ms);
        {
            let mut last = self.inner.last_purge.lock();
            if let Some(prev) = *last {
                if now.duration_since(prev).is_some_and(|since| since < interval) {
                    return;
                }
            }
            *last = Some(now);
        }
        if let Err(e) = self.purge_expired_events() {
            warn!(target: "fieldbook::bus", error = %e, "event purge failed");
        }
    }

    /// Events addressed to `user_id`, newest first
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<Event>> {
        let query = Query::new(self.inner.config.events_collection.as_str())
            .filter("broadcastTo", Operator::ArrayContains, user_id)
            .order_by("timestamp", Direction::Desc)
            .limit(limit);
        evaluate(&query, self.event_log()?)?
            .iter()
            .map(Event::from_document)
            .collect()
    }

    /// Documents of the events collection that decode as events
    fn event_log(&self) -> Result<Vec<Document>> {
        let collection = &self.inner.config.events_collection;
        let docs = self.inner.store.read_all(collection)?;
        let total = docs.len();
        let events: Vec<Document> = docs
            .into_iter()
            .filter(|doc| Event::from_document(doc).is_ok())
            .collect();
        if events.len() < total {
            warn!(
                target: "fieldbook::bus",
                collection = %collection,
                skipped = total - events.len(),
                "ignoring documents that are not events"
            );
        }
        Ok(events)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}
