//! Event records
//!
//! An [`Event`] is an immutable fact addressed to one or more users. Callers
//! describe it with a [`NewEvent`]; the bus assigns the id and timestamp.
//!
//! Persisted form (one document in the events collection):
//!
//! ```text
//! { id, type, userId, data: {..}, timestamp: {"$timestamp": ISO}, broadcastTo: [..] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fieldbook_core::{Document, Error, Fields, Result, Timestamp, Value};

/// Closed set of event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A document owned by the user was created
    DocumentCreated,
    /// A document owned by the user was updated
    DocumentUpdated,
    /// A document owned by the user was deleted
    DocumentDeleted,
    /// Free-form notification for the user
    Notification,
    /// Aggregated statistics changed
    StatsUpdated,
    /// Presence (online/offline) changed
    Presence,
}

impl EventType {
    /// All event kinds
    pub const ALL: [EventType; 6] = [
        EventType::DocumentCreated,
        EventType::DocumentUpdated,
        EventType::DocumentDeleted,
        EventType::Notification,
        EventType::StatsUpdated,
        EventType::Presence,
    ];

    /// Stored spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DocumentCreated => "document_created",
            EventType::DocumentUpdated => "document_updated",
            EventType::DocumentDeleted => "document_deleted",
            EventType::Notification => "notification",
            EventType::StatsUpdated => "stats_updated",
            EventType::Presence => "presence",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown event type '{}'", s)))
    }
}

/// Event as submitted to [`EventBus::broadcast`](crate::EventBus::broadcast)
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Kind of event
    pub event_type: EventType,
    /// User the event is about
    pub user_id: String,
    /// Payload
    pub data: Fields,
    /// Recipients; `None` means just `user_id`
    pub broadcast_to: Option<Vec<String>>,
}

impl NewEvent {
    /// Event about `user_id`, delivered to `user_id`, with no payload
    pub fn new(event_type: EventType, user_id: impl Into<String>) -> Self {
        NewEvent {
            event_type,
            user_id: user_id.into(),
            data: Fields::new(),
            broadcast_to: None,
        }
    }

    /// Replace the payload
    pub fn with_data(mut self, data: Fields) -> Self {
        self.data = data;
        self
    }

    /// Add one payload field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Address the event to an explicit recipient list
    pub fn to<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.broadcast_to = Some(recipients.into_iter().map(Into::into).collect());
        self
    }

    /// Recipients with the default applied and duplicates removed
    ///
    /// First occurrence wins, so the order of the caller's list is kept.
    pub fn recipients(&self) -> Vec<String> {
        match &self.broadcast_to {
            None => vec![self.user_id.clone()],
            Some(list) => {
                let mut out: Vec<String> = Vec::with_capacity(list.len());
                for user in list {
                    if !out.contains(user) {
                        out.push(user.clone());
                    }
                }
                out
            }
        }
    }
}

/// Broadcast event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-minted id
    pub id: String,
    /// Kind of event
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// User the event is about
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Payload
    pub data: Fields,
    /// When the bus accepted the event
    pub timestamp: Timestamp,
    /// De-duplicated recipients
    #[serde(rename = "broadcastTo")]
    pub broadcast_to: Vec<String>,
}

impl Event {
    /// Document fields this event is stored under
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("type".into(), Value::from(self.event_type.as_str()));
        fields.insert("userId".into(), Value::from(self.user_id.as_str()));
        fields.insert("data".into(), Value::Map(self.data.clone()));
        fields.insert("timestamp".into(), Value::Timestamp(self.timestamp));
        fields.insert(
            "broadcastTo".into(),
            Value::Array(self.broadcast_to.iter().map(|u| Value::from(u.as_str())).collect()),
        );
        fields
    }

    /// Rebuild an event from its stored document
    ///
    /// # Errors
    ///
    /// `Error::Serialization` if a field is missing or has the wrong type.
    pub fn from_document(doc: &Document) -> Result<Event> {
        let event_type = required(doc, "type", Value::as_str)?
            .parse::<EventType>()
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let user_id = required(doc, "userId", Value::as_str)?.to_string();
        let data = required(doc, "data", Value::as_map)?.clone();
        let timestamp = required(doc, "timestamp", Value::as_timestamp)?;
        let broadcast_to = required(doc, "broadcastTo", Value::as_array)?
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    Error::Serialization(format!("event {}: non-string recipient", doc.id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Event {
            id: doc.id.clone(),
            event_type,
            user_id,
            data,
            timestamp,
            broadcast_to,
        })
    }

    /// True if `user_id` is among the recipients
    pub fn is_addressed_to(&self, user_id: &str) -> bool {
        self.broadcast_to.iter().any(|u| u == user_id)
    }
}

fn required<'a, T>(
    doc: &'a Document,
    field: &str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T> {
    doc.get(field).and_then(extract).ok_or_else(|| {
        Error::Serialization(format!("event {}: missing or malformed '{}'", doc.id, field))
    })
}
