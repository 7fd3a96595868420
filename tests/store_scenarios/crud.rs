//! CRUD properties
//!
//! Round-trip, unrelated-field preservation on update, delete idempotence,
//! copy semantics of returned documents.

use crate::common::*;
use proptest::prelude::*;
use std::time::Duration;

#[test]
fn created_document_round_trips() {
    let t = TestStore::new();
    let data = fields(json!({
        "title": "Baptism planning",
        "attendees": 12,
        "confirmed": true,
        "budget": 12.5,
        "tags": ["ward", "sunday"],
        "place": {"city": "Lima", "chapel": "Miraflores"}
    }));

    let doc_ref = t.store.collection("investigators").add(data.clone()).unwrap();
    let doc = doc_ref.get().unwrap().unwrap();

    assert_eq!(doc.id, doc_ref.id());
    assert_eq!(doc.fields, data);
    assert_eq!(doc.created_at, Timestamp::from_secs(T0_SECS));
    assert_eq!(doc.updated_at, doc.created_at);
}

#[test]
fn timestamp_values_keep_their_type() {
    let t = TestStore::new();
    let mut data = Fields::new();
    data.insert(
        "visitOn".into(),
        Value::Timestamp(Timestamp::from_secs(T0_SECS + 86_400)),
    );
    let id = t.store.collection("visits").add(data).unwrap();

    let doc = id.get().unwrap().unwrap();
    assert_eq!(
        doc.get("visitOn").and_then(Value::as_timestamp),
        Some(Timestamp::from_secs(T0_SECS + 86_400))
    );
}

#[test]
fn timestamp_without_iso_form_is_rejected() {
    let t = TestStore::new();
    let visits = t.store.collection("visits");
    let mut data = Fields::new();
    data.insert(
        "far".into(),
        Value::Timestamp(Timestamp::from_micros(u64::MAX)),
    );

    let err = visits.add(data.clone()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);

    let visit = visits.add(fields(json!({"n": 1}))).unwrap();
    let err = visit.update(data).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(visit.get().unwrap().unwrap().get("far"), None);
}

#[test]
fn tag_shaped_map_is_rejected_not_reinterpreted() {
    let t = TestStore::new();
    let mut tagged = Fields::new();
    tagged.insert("$timestamp".into(), Value::from("2024-03-01T09:30:00Z"));
    let mut data = Fields::new();
    data.insert("meta".into(), Value::Map(tagged));

    let err = t.store.collection("diary").add(data).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);
    assert_eq!(t.store.collection("diary").count().unwrap(), 0);
}

#[test]
fn update_preserves_unrelated_fields() {
    let t = TestStore::new();
    let sponsor = t
        .store
        .collection("sponsors")
        .add(fields(json!({"name": "Ana", "monthly": 50, "city": "Provo"})))
        .unwrap();
    t.advance(Duration::from_secs(90));

    sponsor.update(fields(json!({"monthly": 75}))).unwrap();

    let doc = sponsor.get().unwrap().unwrap();
    assert_eq!(doc.get("name"), Some(&Value::from("Ana")));
    assert_eq!(doc.get("city"), Some(&Value::from("Provo")));
    assert_eq!(doc.get("monthly"), Some(&Value::Int(75)));
    assert_eq!(doc.created_at, Timestamp::from_secs(T0_SECS));
    assert_eq!(doc.updated_at, Timestamp::from_secs(T0_SECS + 90));
}

#[test]
fn update_of_missing_document_is_not_found() {
    let t = TestStore::new();
    let err = t
        .store
        .collection("sponsors")
        .doc("nobody")
        .update(fields(json!({"monthly": 1})))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn delete_is_idempotent() {
    let t = TestStore::new();
    let transfers = t.store.collection("transfers");
    let keep = transfers.add(fields(json!({"amount": 1}))).unwrap();
    let gone = transfers.add(fields(json!({"amount": 2}))).unwrap();

    assert!(gone.delete().unwrap());
    let after_first = transfers.get().unwrap();
    let saves = t.backend.save_count();

    assert!(!gone.delete().unwrap());
    assert_eq!(transfers.get().unwrap(), after_first);
    assert_eq!(t.backend.save_count(), saves, "no write for a missing id");
    assert_eq!(ids(&after_first), vec![keep.id().to_string()]);
}

#[test]
fn reserved_field_names_are_rejected() {
    let t = TestStore::new();
    for name in ["id", "createdAt", "updatedAt"] {
        let mut data = Fields::new();
        data.insert(name.into(), Value::from("x"));
        let err = t.store.collection("diary").add(data).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{}", name);
    }
}

#[test]
fn returned_documents_are_copies() {
    let t = TestStore::new();
    let entry = t
        .store
        .collection("diary")
        .add(fields(json!({"mood": "good"})))
        .unwrap();

    let mut all = t.store.collection("diary").get().unwrap();
    all[0].fields.insert("mood".into(), Value::from("changed"));
    all.clear();

    let fresh = entry.get().unwrap().unwrap();
    assert_eq!(fresh.get("mood"), Some(&Value::from("good")));
}

#[test]
fn collections_are_listed_after_first_write() {
    let t = TestStore::new();
    assert!(t.store.collections().unwrap().is_empty());
    let _ = t.store.collection("diary").doc("x").get().unwrap();
    assert!(t.store.collections().unwrap().is_empty());

    t.store.collection("diary").add(Fields::new()).unwrap();
    t.store.collection("sponsors").add(Fields::new()).unwrap();
    let mut names = t.store.collections().unwrap();
    names.sort();
    assert_eq!(names, vec!["diary".to_string(), "sponsors".to_string()]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_flat_record_round_trips(
        title in "[a-zA-Z ]{0,20}",
        count in any::<i64>(),
        flag in any::<bool>(),
        tags in proptest::collection::vec("[a-z]{1,6}", 0..4),
    ) {
        let store = Store::ephemeral().unwrap();
        let data = fields(json!({"title": title, "count": count, "flag": flag, "tags": tags}));
        let doc_ref = store.collection("diary").add(data.clone()).unwrap();
        let doc = doc_ref.get().unwrap().unwrap();
        prop_assert_eq!(doc.fields, data);
    }
}
