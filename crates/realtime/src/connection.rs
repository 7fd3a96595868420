//! Connection registry
//!
//! Lifecycle of one connection:
//!
//! ```text
//! connect ──► active ──┬── heartbeat (refresh last_seen) ──► active
//!                      ├── idle longer than timeout ─────► removed by sweep
//!                      └── disconnect ────────────────────► removed
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fieldbook_core::Timestamp;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new random ConnectionId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a ConnectionId from its string form
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live connection of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection id
    pub id: ConnectionId,
    /// Owning user
    pub user_id: String,
    /// When the connection was opened
    pub connected_at: Timestamp,
    /// Last connect or heartbeat
    pub last_seen: Timestamp,
}

impl Connection {
    /// True if idle for longer than `timeout` at `now`
    pub fn is_idle(&self, now: Timestamp, timeout: Duration) -> bool {
        now.duration_since(self.last_seen)
            .is_some_and(|idle| idle > timeout)
    }

    /// Inverse of [`is_idle`](Connection::is_idle)
    pub fn is_active(&self, now: Timestamp, timeout: Duration) -> bool {
        !self.is_idle(now, timeout)
    }
}

/// Connections keyed by id
#[derive(Debug, Default)]
pub(crate) struct Registry {
    connections: HashMap<ConnectionId, Connection>,
}

impl Registry {
    pub(crate) fn insert(&mut self, user_id: &str, now: Timestamp) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(
            id,
            Connection {
                id,
                user_id: user_id.to_string(),
                connected_at: now,
                last_seen: now,
            },
        );
        id
    }

    pub(crate) fn touch(&mut self, id: &ConnectionId, now: Timestamp) -> bool {
        match self.connections.get_mut(id) {
            Some(conn) => {
                conn.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Drop idle connections, returning them
    pub(crate) fn sweep(&mut self, now: Timestamp, timeout: Duration) -> Vec<Connection> {
        let idle: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.is_idle(now, timeout))
            .map(|c| c.id)
            .collect();
        idle.iter()
            .filter_map(|id| self.connections.remove(id))
            .collect()
    }

    pub(crate) fn for_user(&self, user_id: &str) -> Vec<Connection> {
        let mut out: Vec<Connection> = self
            .connections
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|c| c.connected_at);
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }
}
