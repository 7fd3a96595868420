//! Document changes as realtime events
//!
//! [`BusChangeNotifier`] is installed as the document store's change
//! listener. Every committed mutation of a document carrying a string
//! `userId` field becomes a `document_*` event addressed to that user.
//!
//! The bus persists its own events through the same store, so changes to the
//! events collection are ignored. The notifier holds only a weak handle to
//! the bus; the store may outlive it.

use fieldbook_core::Value;
use fieldbook_engine::{ChangeKind, ChangeListener, DocumentChange};

use crate::bus::{EventBus, WeakEventBus};
use crate::event::{EventType, NewEvent};

/// Field naming the user a document belongs to
pub const OWNER_FIELD: &str = "userId";

/// Change listener that broadcasts document events
pub struct BusChangeNotifier {
    bus: WeakEventBus,
    events_collection: String,
}

impl BusChangeNotifier {
    /// Notifier feeding `bus`
    pub fn new(bus: &EventBus) -> Self {
        BusChangeNotifier {
            bus: bus.downgrade(),
            events_collection: bus.config().events_collection.clone(),
        }
    }
}

impl ChangeListener for BusChangeNotifier {
    fn on_change(&self, change: &DocumentChange) {
        if change.collection == self.events_collection {
            return;
        }
        let Some(owner) = change.document.get(OWNER_FIELD).and_then(Value::as_str) else {
            return;
        };
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let event_type = match change.kind {
            ChangeKind::Created => EventType::DocumentCreated,
            ChangeKind::Updated => EventType::DocumentUpdated,
            ChangeKind::Deleted => EventType::DocumentDeleted,
        };
        bus.broadcast(
            NewEvent::new(event_type, owner)
                .with_field("collection", change.collection.as_str())
                .with_field("documentId", change.document.id.as_str()),
        );
    }
}
