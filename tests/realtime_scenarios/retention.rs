//! Event retention and history
//!
//! Test config: 60s retention, cleanup batches of 3, purge on every
//! broadcast.

use crate::common::*;
use std::time::Duration;

fn events_stored(t: &TestStore) -> usize {
    t.store.collection("events").count().unwrap()
}

/// One notification per second starting at T0.
fn broadcast_series(t: &TestStore, n: usize) -> Vec<Event> {
    (0..n)
        .map(|i| {
            let event = t
                .store
                .bus()
                .broadcast(NewEvent::new(EventType::Notification, "A").with_field("seq", i as i64));
            t.advance(Duration::from_secs(1));
            event
        })
        .collect()
}

#[test]
fn purge_removes_oldest_expired_in_batches() {
    let t = TestStore::new();
    let sent = broadcast_series(&t, 6);
    assert_eq!(events_stored(&t), 6);

    // cutoff T0+4: the first four are expired
    t.clock.set(Timestamp::from_secs(T0_SECS + 64));
    let bus = t.store.bus();
    assert_eq!(bus.purge_expired_events().unwrap(), 3);
    assert_eq!(bus.purge_expired_events().unwrap(), 1);
    assert_eq!(bus.purge_expired_events().unwrap(), 0);

    let left: Vec<String> = bus
        .history("A", 10)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(left, vec![sent[5].id.clone(), sent[4].id.clone()]);
}

#[test]
fn nothing_expires_within_retention() {
    let t = TestStore::new();
    broadcast_series(&t, 3);
    t.clock.set(Timestamp::from_secs(T0_SECS + 60));
    assert_eq!(t.store.bus().purge_expired_events().unwrap(), 0);
    assert_eq!(events_stored(&t), 3);
}

#[test]
fn broadcast_purges_a_batch_opportunistically() {
    let t = TestStore::new();
    broadcast_series(&t, 5);
    t.advance(Duration::from_secs(120));

    t.store.bus().broadcast(NewEvent::new(EventType::Presence, "A"));
    assert_eq!(events_stored(&t), 5 + 1 - 3);

    t.store.bus().broadcast(NewEvent::new(EventType::Presence, "A"));
    assert_eq!(events_stored(&t), 2);
    let kinds: Vec<_> = t
        .store
        .bus()
        .history("A", 10)
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(kinds, vec![EventType::Presence, EventType::Presence]);
}

#[test]
fn history_is_newest_first_per_recipient() {
    let t = TestStore::new();
    let bus = t.store.bus();
    let n1 = bus.broadcast(NewEvent::new(EventType::Notification, "A"));
    t.advance(Duration::from_secs(1));
    let n2 = bus.broadcast(NewEvent::new(EventType::StatsUpdated, "A").to(["A", "B"]));
    t.advance(Duration::from_secs(1));
    let n3 = bus.broadcast(NewEvent::new(EventType::Notification, "A").to(["B"]));

    assert_eq!(bus.history("A", 10).unwrap(), vec![n2.clone(), n1]);
    assert_eq!(bus.history("A", 1).unwrap(), vec![n2.clone()]);
    assert_eq!(bus.history("B", 10).unwrap(), vec![n3, n2]);
    assert!(bus.history("C", 10).unwrap().is_empty());
}

#[test]
fn stored_events_keep_their_shape() {
    let t = TestStore::new();
    let sent = t.store.bus().broadcast(
        NewEvent::new(EventType::Notification, "A")
            .with_field("message", "Zone conference moved")
            .to(["A", "B"]),
    );

    let doc = t
        .store
        .collection("events")
        .doc(sent.id.as_str())
        .get()
        .unwrap()
        .unwrap();
    assert_eq!(str_field(&doc, "type"), "notification");
    assert_eq!(str_field(&doc, "userId"), "A");
    assert_eq!(
        doc.get("timestamp").and_then(Value::as_timestamp),
        Some(sent.timestamp)
    );
    assert_eq!(
        doc.get_path("data.message").and_then(Value::as_str),
        Some("Zone conference moved")
    );
    assert_eq!(Event::from_document(&doc).unwrap(), sent);
}

#[test]
fn events_collection_is_read_only_through_the_facade() {
    let t = TestStore::new();
    let sent = t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    let events = t.store.collection("events");
    assert!(events.is_read_only());
    assert!(!t.store.collection("diary").is_read_only());

    let err = events.add(fields(json!({"type": "notification"}))).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);

    let stored = events.doc(sent.id.as_str());
    let err = stored.update(fields(json!({"userId": "B"}))).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(matches!(stored.set(Fields::new()), Err(Error::Validation(_))));
    assert!(matches!(stored.delete(), Err(Error::Validation(_))));

    assert_eq!(events_stored(&t), 1);
    assert_eq!(stored.get().unwrap().unwrap().id, sent.id);
}

#[test]
fn purge_and_history_skip_documents_that_are_not_events() {
    let t = TestStore::new();
    let documents = t.store.documents();

    // written below the facade, so the bus must tolerate them
    let dated = documents
        .create("events", fields(json!({"timestamp": "2024-05-01"})))
        .unwrap();
    let mut stale = fields(json!({"broadcastTo": ["A"], "note": "imported"}));
    stale.insert(
        "timestamp".into(),
        Value::Timestamp(Timestamp::from_secs(T0_SECS - 3_600)),
    );
    let stale = documents.create("events", stale).unwrap();

    let bus = t.store.bus();
    let n1 = bus.broadcast(NewEvent::new(EventType::Notification, "A"));
    t.advance(Duration::from_secs(1));
    let n2 = bus.broadcast(NewEvent::new(EventType::Notification, "A"));
    assert_eq!(events_stored(&t), 4, "broadcast purge left the foreign docs alone");

    assert_eq!(bus.history("A", 10).unwrap(), vec![n2, n1]);

    t.advance(Duration::from_secs(120));
    assert_eq!(bus.purge_expired_events().unwrap(), 2);
    assert_eq!(bus.purge_expired_events().unwrap(), 0);

    let mut left = ids(&t.store.collection("events").get().unwrap());
    left.sort();
    let mut foreign = vec![dated, stale];
    foreign.sort();
    assert_eq!(left, foreign);
    assert!(bus.history("A", 10).unwrap().is_empty());
}
