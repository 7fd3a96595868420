//! Delivery guarantees
//!
//! Only addressed users hear an event, each listener exactly once, and a
//! failing listener or backend never blocks the others.

use crate::common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn fan_out_reaches_only_recipients() {
    let t = TestStore::new();
    let (a, _sa) = Inbox::subscribe(&t.store, "A");
    let (b, _sb) = Inbox::subscribe(&t.store, "B");
    let (c, _sc) = Inbox::subscribe(&t.store, "C");

    let sent = t.store.bus().broadcast(
        NewEvent::new(EventType::StatsUpdated, "A")
            .with_field("baptisms", 3)
            .to(["A", "B"]),
    );

    assert_eq!(a.events(), vec![sent.clone()]);
    assert_eq!(b.events(), vec![sent.clone()]);
    assert!(c.is_empty());
    assert_eq!(sent.data.get("baptisms"), Some(&Value::Int(3)));
}

#[test]
fn duplicate_recipients_deliver_once() {
    let t = TestStore::new();
    let (a, _sa) = Inbox::subscribe(&t.store, "A");

    let sent = t
        .store
        .bus()
        .broadcast(NewEvent::new(EventType::Notification, "A").to(["A", "B", "A", "A"]));

    assert_eq!(a.len(), 1);
    assert_eq!(sent.broadcast_to, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn recipients_default_to_the_subject_user() {
    let t = TestStore::new();
    let (a, _sa) = Inbox::subscribe(&t.store, "A");
    let (b, _sb) = Inbox::subscribe(&t.store, "B");

    t.store.bus().broadcast(NewEvent::new(EventType::Presence, "A"));
    assert_eq!(a.kinds(), vec![EventType::Presence]);
    assert!(b.is_empty());

    // an explicit empty list reaches nobody
    let silent = t
        .store
        .bus()
        .broadcast(NewEvent::new(EventType::Presence, "A").to(Vec::<String>::new()));
    assert!(silent.broadcast_to.is_empty());
    assert_eq!(a.len(), 1);
}

#[test]
fn every_listener_of_a_user_is_called() {
    let t = TestStore::new();
    let (first, _s1) = Inbox::subscribe(&t.store, "A");
    let (second, _s2) = Inbox::subscribe(&t.store, "A");
    assert_eq!(t.store.bus().listener_count("A"), 2);

    t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[test]
fn bus_assigns_id_and_timestamp() {
    let t = TestStore::new();
    let first = t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    t.advance(std::time::Duration::from_secs(5));
    let second = t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));

    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);
    assert_eq!(first.timestamp, Timestamp::from_secs(T0_SECS));
    assert_eq!(second.timestamp, Timestamp::from_secs(T0_SECS + 5));
}

#[test]
fn panicking_listener_does_not_block_others() {
    let t = TestStore::new();
    let _bad = t
        .store
        .bus()
        .subscribe("A", |_| panic!("listener failure"));
    let (good, _sg) = Inbox::subscribe(&t.store, "A");
    let (other, _so) = Inbox::subscribe(&t.store, "B");

    t.store
        .bus()
        .broadcast(NewEvent::new(EventType::Notification, "A").to(["A", "B"]));

    assert_eq!(good.len(), 1);
    assert_eq!(other.len(), 1);

    // the bus keeps working afterwards
    t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    assert_eq!(good.len(), 2);
}

#[test]
fn unsubscribe_stops_delivery() {
    let t = TestStore::new();
    let (kept, _keep) = Inbox::subscribe(&t.store, "A");
    let (dropped, sub) = Inbox::subscribe(&t.store, "A");

    t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    assert!(sub.unsubscribe());
    t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));

    assert_eq!(kept.len(), 2);
    assert_eq!(dropped.len(), 1);
    assert_eq!(t.store.bus().listener_count("A"), 1);
}

#[test]
fn listener_may_broadcast_from_its_callback() {
    let t = TestStore::new();
    let bus = t.store.bus().clone();
    let _relay = t.store.bus().subscribe("A", move |event| {
        if event.event_type == EventType::Notification {
            bus.broadcast(NewEvent::new(EventType::StatsUpdated, "A").to(["B"]));
        }
    });
    let (b, _sb) = Inbox::subscribe(&t.store, "B");

    t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    assert_eq!(b.kinds(), vec![EventType::StatsUpdated]);
}

#[test]
fn persistence_failure_still_delivers() {
    let t = TestStore::new();
    let (a, _sa) = Inbox::subscribe(&t.store, "A");

    t.backend.fail_saves(true);
    let sent = t.store.bus().broadcast(NewEvent::new(EventType::Notification, "A"));
    t.backend.fail_saves(false);

    assert_eq!(a.events(), vec![sent]);
    assert!(t.store.bus().history("A", 10).unwrap().is_empty());
}

#[test]
fn concurrent_broadcasts_each_delivered_once() {
    let t = TestStore::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let _sub = t.store.bus().subscribe("A", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bus = t.store.bus().clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    bus.broadcast(NewEvent::new(EventType::Notification, "A"));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(seen.load(Ordering::SeqCst), 40);
    assert_eq!(t.store.bus().history("A", 100).unwrap().len(), 40);
}
