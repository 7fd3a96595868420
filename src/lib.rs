//! Fieldbook - embedded document store and realtime event bus
//!
//! Fieldbook is the data substrate of the missionary journal: a small
//! document database (collections, documents, fluent queries) over a
//! pluggable persistence backend, plus a realtime bus that fans events out
//! to connected users.
//!
//! # Quick Start
//!
//! ```ignore
//! use fieldbook::{Operator, Store};
//!
//! // Create an in-memory store
//! let store = Store::ephemeral()?;
//!
//! // Add a diary entry
//! let diary = store.collection("diary");
//! let entry = diary.add(fields_from_json(json!({"title": "Day 1", "mood": "good"}))?)?;
//!
//! // Query it back
//! let good = diary.filter("mood", Operator::Eq, "good").get()?;
//! ```
//!
//! # Architecture
//!
//! Feature code goes through the [`Store`] facade. Lower layers are
//! re-exported as modules for callers that need them directly:
//! [`engine`] (DocumentStore, queries), [`storage`] (backends) and
//! [`realtime`] (EventBus).

// Re-export the public API from fieldbook-api
pub use fieldbook_api::*;

pub use fieldbook_core::{fields_from_json, to_fields, Clock, ManualClock, Timestamp};
pub use fieldbook_realtime::{Event, EventBus, EventType, NewEvent, Subscription};

/// Core types: values, documents, timestamps, errors
pub use fieldbook_core as core;
/// Document store and query engine
pub use fieldbook_engine as engine;
/// Event bus
pub use fieldbook_realtime as realtime;
/// Persistence backends
pub use fieldbook_storage as storage;
