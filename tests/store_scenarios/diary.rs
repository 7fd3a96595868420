//! Diary walkthrough
//!
//! Empty collection → add → filter by mood → update mood → filter again.

use crate::common::*;

#[test]
fn diary_entry_moves_between_mood_queries() {
    let t = TestStore::new();
    let diary = t.store.collection("diary");
    assert!(diary.get().unwrap().is_empty());

    let d1 = diary
        .add(fields(json!({"title": "Day 1", "mood": "good"})))
        .unwrap();

    let good = diary.filter("mood", Operator::Eq, "good").get().unwrap();
    assert_eq!(ids(&good), vec![d1.id().to_string()]);
    assert_eq!(str_field(&good[0], "title"), "Day 1");
    assert_eq!(str_field(&good[0], "mood"), "good");
    assert!(good[0].created_at > Timestamp::EPOCH);

    d1.update(fields(json!({"mood": "excellent"}))).unwrap();

    assert!(diary
        .filter("mood", Operator::Eq, "good")
        .get()
        .unwrap()
        .is_empty());
    let excellent = diary
        .filter_op("mood", "==", "excellent")
        .unwrap()
        .get()
        .unwrap();
    assert_eq!(ids(&excellent), vec![d1.id().to_string()]);
    assert_eq!(str_field(&excellent[0], "title"), "Day 1");
}

#[test]
fn diary_entries_newest_first() {
    let t = TestStore::new();
    let diary = t.store.collection("diary");
    for day in 1..=5 {
        diary
            .add(fields(json!({"title": format!("Day {}", day), "day": day})))
            .unwrap();
        t.advance(std::time::Duration::from_secs(3600));
    }

    let latest = diary.order_by_desc("createdAt").limit(2).get().unwrap();
    let titles: Vec<&str> = latest.iter().map(|d| str_field(d, "title")).collect();
    assert_eq!(titles, vec!["Day 5", "Day 4"]);
}

#[test]
fn diary_entries_per_user() {
    let t = TestStore::new();
    let diary = t.store.collection("diary");
    for (user, title) in [("u1", "a"), ("u2", "b"), ("u1", "c")] {
        diary
            .add(fields(json!({"userId": user, "title": title})))
            .unwrap();
    }

    let mine = diary.filter("userId", Operator::Eq, "u1");
    assert_eq!(mine.count().unwrap(), 2);
    let titles: Vec<String> = mine
        .get()
        .unwrap()
        .iter()
        .map(|d| str_field(d, "title").to_string())
        .collect();
    assert_eq!(titles, vec!["a", "c"]);
}
