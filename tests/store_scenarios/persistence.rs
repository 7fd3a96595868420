//! Persistence behaviour
//!
//! File backend reopen, on-disk naming, and backend failures surfacing as
//! storage errors without partial state.

use crate::common::*;
use fieldbook::storage::FileBackend;
use fieldbook::CONFIG_FILE_NAME;

#[test]
fn documents_survive_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let store = Store::open_dir(dir.path()).unwrap();
        let entry = store
            .collection("diary")
            .add(fields(json!({"title": "Day 1", "mood": "good"})))
            .unwrap();
        entry.update(fields(json!({"mood": "excellent"}))).unwrap();
        entry.id().to_string()
    };

    let store = Store::open_dir(dir.path()).unwrap();
    let doc = store.collection("diary").doc(id.as_str()).get().unwrap().unwrap();
    assert_eq!(str_field(&doc, "title"), "Day 1");
    assert_eq!(str_field(&doc, "mood"), "excellent");
    assert!(doc.updated_at >= doc.created_at);
    assert_eq!(store.collections().unwrap(), vec!["diary".to_string()]);
}

#[test]
fn open_dir_writes_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_dir(dir.path()).unwrap();

    let path = dir.path().join(CONFIG_FILE_NAME);
    assert!(path.exists());
    let on_disk = FieldbookConfig::from_file(&path).unwrap();
    assert_eq!(on_disk.store_prefix, store.config().store_prefix);
    assert_eq!(store.config().backend, "file");
}

#[test]
fn one_file_per_collection_under_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = FieldbookConfig::file(dir.path());
    config.store_prefix = "ward".to_string();
    config.realtime.sweep_interval_ms = 0;
    let store = Store::open(config).unwrap();

    store.collection("sponsors").add(fields(json!({"monthly": 50}))).unwrap();
    store.collection("transfers").add(fields(json!({"amount": 50}))).unwrap();

    assert!(dir.path().join("ward-sponsors.json").is_file());
    assert!(dir.path().join("ward-transfers.json").is_file());
    assert!(!dir.path().join("ward-diary.json").exists());

    let backend = FileBackend::open(dir.path(), "ward").unwrap();
    assert_eq!(backend.path_for("diary"), dir.path().join("ward-diary.json"));
}

#[test]
fn prefixes_isolate_stores_in_one_directory() {
    let dir = tempfile::tempdir().unwrap();
    let open = |prefix: &str| {
        let mut config = FieldbookConfig::file(dir.path());
        config.store_prefix = prefix.to_string();
        config.realtime.sweep_interval_ms = 0;
        Store::open(config).unwrap()
    };

    let a = open("alpha");
    let b = open("beta");
    a.collection("diary").add(fields(json!({"n": 1}))).unwrap();

    assert_eq!(a.collection("diary").count().unwrap(), 1);
    assert_eq!(b.collection("diary").count().unwrap(), 0);
}

#[test]
fn failed_save_is_storage_error_and_changes_nothing() {
    let t = TestStore::new();
    let sponsors = t.store.collection("sponsors");
    let ana = sponsors.add(fields(json!({"name": "Ana"}))).unwrap();

    t.backend.fail_saves(true);
    let err = sponsors.add(fields(json!({"name": "Ben"}))).unwrap_err();
    assert!(err.is_storage(), "{:?}", err);
    let err = ana.update(fields(json!({"name": "Anne"}))).unwrap_err();
    assert!(err.is_storage());
    assert!(ana.delete().unwrap_err().is_storage());

    t.backend.fail_saves(false);
    let docs = sponsors.get().unwrap();
    assert_eq!(ids(&docs), vec![ana.id().to_string()]);
    assert_eq!(str_field(&docs[0], "name"), "Ana");
}

#[test]
fn failed_load_fails_reads_and_writes() {
    let t = TestStore::new();
    let diary = t.store.collection("diary");
    let entry = diary.add(fields(json!({"mood": "good"}))).unwrap();

    t.backend.fail_loads(true);
    assert!(diary.get().unwrap_err().is_storage());
    assert!(entry.get().unwrap_err().is_storage());
    assert!(diary
        .filter("mood", Operator::Eq, "good")
        .count()
        .unwrap_err()
        .is_storage());
    assert!(diary.add(Fields::new()).unwrap_err().is_storage());

    t.backend.fail_loads(false);
    assert_eq!(diary.count().unwrap(), 1);
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    let mut config = FieldbookConfig::file(dir.path());
    config.store_prefix = "mission".to_string();
    config.realtime.cleanup_batch_size = 25;
    config.write_to_file(&path).unwrap();

    let loaded = FieldbookConfig::from_file(&path).unwrap();
    assert_eq!(loaded.store_prefix, "mission");
    assert_eq!(loaded.backend, "file");
    assert_eq!(loaded.data_dir.as_deref(), Some(dir.path()));
    assert_eq!(loaded.realtime.cleanup_batch_size, 25);
}

#[test]
fn invalid_config_is_rejected_on_open() {
    let mut config = FieldbookConfig::memory("ok");
    config.backend = "redis".to_string();
    assert!(matches!(Store::open(config), Err(Error::Validation(_))));

    let config = FieldbookConfig::memory("bad/prefix");
    assert!(matches!(Store::open(config), Err(Error::Validation(_))));
}
