//! Document writes as events
//!
//! Documents carrying a `userId` field notify their owner on every
//! committed change.

use crate::common::*;

fn data_str<'a>(event: &'a Event, field: &str) -> &'a str {
    event
        .data
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("event {} has no '{}'", event.id, field))
}

#[test]
fn owner_hears_create_update_delete() {
    let t = TestStore::new();
    let (inbox, _sub) = Inbox::subscribe(&t.store, "u1");

    let entry = t
        .store
        .collection("diary")
        .add(fields(json!({"userId": "u1", "mood": "good"})))
        .unwrap();
    entry.update(fields(json!({"mood": "excellent"}))).unwrap();
    entry.delete().unwrap();

    assert_eq!(
        inbox.kinds(),
        vec![
            EventType::DocumentCreated,
            EventType::DocumentUpdated,
            EventType::DocumentDeleted
        ]
    );
    for event in inbox.events() {
        assert_eq!(event.user_id, "u1");
        assert_eq!(event.broadcast_to, vec!["u1".to_string()]);
        assert_eq!(data_str(&event, "collection"), "diary");
        assert_eq!(data_str(&event, "documentId"), entry.id());
    }
}

#[test]
fn set_reports_create_then_update() {
    let t = TestStore::new();
    let (inbox, _sub) = Inbox::subscribe(&t.store, "u1");
    let sponsor = t.store.collection("sponsors").doc("s1");

    sponsor.set(fields(json!({"userId": "u1", "monthly": 50}))).unwrap();
    sponsor.set_merge(fields(json!({"monthly": 60}))).unwrap();

    assert_eq!(
        inbox.kinds(),
        vec![EventType::DocumentCreated, EventType::DocumentUpdated]
    );
}

#[test]
fn other_users_and_unowned_documents_are_silent() {
    let t = TestStore::new();
    let (u1, _s1) = Inbox::subscribe(&t.store, "u1");
    let (u2, _s2) = Inbox::subscribe(&t.store, "u2");

    t.store
        .collection("diary")
        .add(fields(json!({"userId": "u2", "mood": "tired"})))
        .unwrap();
    t.store
        .collection("transfers")
        .add(fields(json!({"amount": 40})))
        .unwrap();
    t.store
        .collection("diary")
        .add(fields(json!({"userId": 7, "mood": "odd"})))
        .unwrap();

    assert!(u1.is_empty());
    assert_eq!(u2.kinds(), vec![EventType::DocumentCreated]);
}

#[test]
fn failed_write_sends_no_event() {
    let t = TestStore::new();
    let (inbox, _sub) = Inbox::subscribe(&t.store, "u1");

    t.backend.fail_saves(true);
    assert!(t
        .store
        .collection("diary")
        .add(fields(json!({"userId": "u1"})))
        .is_err());
    t.backend.fail_saves(false);

    assert!(inbox.is_empty());
}

#[test]
fn document_events_are_persisted_once() {
    let t = TestStore::new();
    t.store
        .collection("diary")
        .add(fields(json!({"userId": "u1", "mood": "good"})))
        .unwrap();

    // writing the event itself must not produce another event
    let history = t.store.bus().history("u1", 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(t.store.collection("events").count().unwrap(), 1);
}
