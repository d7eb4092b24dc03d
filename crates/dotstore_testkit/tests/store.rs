//! Integration tests for the store over real files.

use dotstore_codec::Codec;
use dotstore_core::{ChangeEvent, ChangeFeed, Config, EventKind, Store, Value};
use dotstore_testkit::prelude::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn recorded(feed: &ChangeFeed) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    feed.on_any(move |_, event| sink.lock().push(event.clone()));
    events
}

#[test]
fn dot_paths_build_and_replace_objects() {
    with_temp_store(|store| {
        store.set("a.b.c", 1).unwrap();
        assert_eq!(store.get("a.b"), Some(&Value::from(json!({"c": 1}))));

        store.set("x", 1).unwrap();
        store.set("x.y", 2).unwrap();
        assert_eq!(store.get("x"), Some(&Value::from(json!({"y": 2}))));
    });
}

#[test]
fn delete_of_unknown_key_writes_nothing() {
    let feed = ChangeFeed::new();
    let events = recorded(&feed);
    let mut test_store = TestStore::with_feed(|config| config.pretty(false), feed);
    test_store.set("keep", true).unwrap();
    let before = std::fs::metadata(test_store.path()).unwrap().modified().unwrap();
    let emitted = events.lock().len();

    assert!(!test_store.delete("never.set"));

    assert_eq!(events.lock().len(), emitted);
    assert_eq!(
        std::fs::metadata(test_store.path()).unwrap().modified().unwrap(),
        before
    );
    assert_eq!(test_store.read_text(), r#"{"keep":true}"#);
}

#[test]
fn push_then_pull_round_trip() {
    with_temp_store(|store| {
        store.push("arr", [1]).unwrap();
        assert!(store.pull("arr", 1).unwrap().is_empty());

        store.push("arr", ["a", "b", "a"]).unwrap();
        let left = store
            .pull_where("arr", |v| v.as_str() == Some("a"))
            .unwrap();
        assert_eq!(left, vec![Value::from("b")]);
    });
}

#[test]
fn counter_starts_at_zero_and_division_by_zero_is_infinite() {
    with_temp_store(|store| {
        assert_eq!(store.add("n", 5.0).unwrap(), 5.0);
        assert_eq!(store.math("n", "/", 0.0).unwrap(), f64::INFINITY);
    });
}

#[test]
fn infinite_numbers_are_written_as_null() {
    let mut test_store = TestStore::with_config(|config| config.pretty(false));
    test_store.set("n", 1).unwrap();
    test_store.math("n", "/", 0.0).unwrap();

    assert_eq!(test_store.read_text(), r#"{"n":null}"#);
    test_store.reopen();
    assert_eq!(test_store.get("n"), Some(&Value::Null));
}

#[test]
fn cached_reads_ignore_external_writes_until_reload() {
    let mut test_store = TestStore::new();
    test_store.set("a", 1).unwrap();

    test_store.write_raw(r#"{"a": 99}"#);
    assert_eq!(test_store.get("a"), Some(&Value::from(1)));

    test_store.reload();
    assert_eq!(test_store.get("a"), Some(&Value::from(99)));
}

#[test]
fn independent_instances_do_not_see_each_other() {
    let mut test_store = TestStore::new();
    let mut other = test_store.open_again();

    test_store.set("from_first", 1).unwrap();
    other.set("from_second", 2).unwrap();

    // Last writer wins on disk.
    assert!(!other.has("from_first"));
    test_store.reopen();
    assert!(test_store.has("from_second"));
    assert!(!test_store.has("from_first"));
}

#[test]
fn encrypted_file_never_contains_plaintext() {
    let mut test_store = TestStore::encrypted();
    test_store.set("credentials.password", "correct horse battery staple").unwrap();
    test_store.set("credentials.user", "ada").unwrap();

    let raw = test_store.read_text();
    assert!(!raw.contains("correct horse"));
    assert!(!raw.contains("credentials"));

    let (iv, ciphertext) = raw.split_once(':').unwrap();
    assert_eq!(iv.len(), 32);
    assert_eq!(ciphertext.len() % 32, 0);
}

#[test]
fn encrypted_file_opened_without_key_starts_empty() {
    let mut test_store = TestStore::encrypted();
    test_store.set("secret", 1).unwrap();
    let sealed = test_store.read_raw();

    let plain = Store::open(Config::new().path(test_store.path())).unwrap();
    assert!(plain.is_empty());
    // Loading never rewrites an undecodable file.
    assert_eq!(test_store.read_raw(), sealed);
}

#[test]
fn encrypted_file_opened_with_wrong_key_starts_empty() {
    let mut test_store = TestStore::encrypted();
    test_store.set("secret", 1).unwrap();

    let config = Config::new()
        .path(test_store.path())
        .encryption_key("ffffffffffffffffffffffffffffffff");
    let feed = ChangeFeed::new();
    let events = recorded(&feed);
    let store = Store::open_with_feed(config, feed).unwrap();

    assert!(store.is_empty());
    assert_eq!(*events.lock(), vec![ChangeEvent::Ready]);
}

#[test]
fn plain_file_can_be_opened_with_a_key() {
    let mut test_store = TestStore::new();
    test_store.set("migrated", true).unwrap();

    let mut store = Store::open(Config::new().path(test_store.path()).encryption_key(TEST_KEY)).unwrap();
    assert_eq!(store.get("migrated"), Some(&Value::Bool(true)));

    // The next write re-encrypts the file.
    store.set("migrated", false).unwrap();
    let raw = test_store.read_text();
    assert!(!raw.contains("migrated"));
    assert_eq!(
        Codec::encrypted(TEST_KEY.parse().unwrap()).decode(raw.as_bytes()).unwrap()["migrated"],
        Value::Bool(false)
    );
}

#[test]
fn blank_and_corrupt_files_load_empty() {
    let test_store = TestStore::new();

    for contents in ["", "   \n", "{\"truncated\": ", "[1, 2, 3]", "\"text\""] {
        test_store.write_raw(contents);
        let store = test_store.open_again();
        assert!(store.is_empty(), "{contents:?} should load empty");
        assert_eq!(test_store.read_text(), contents);
    }
}

#[test]
fn missing_parent_directories_are_created() {
    let test_store = TestStore::new();
    let path = test_store.sibling("nested").join("deeper").join("db.json");

    let mut store = Store::open(&*path).unwrap();
    store.set("a", 1).unwrap();
    assert!(path.exists());
}

#[test]
fn ready_fires_once_per_load() {
    let feed = ChangeFeed::new();
    let ready = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&ready);
    feed.on(EventKind::Ready, move |_, _| *counter.lock() += 1);

    let mut test_store = TestStore::with_feed(|config| config, feed);
    assert_eq!(*ready.lock(), 1);

    test_store.reload();
    assert_eq!(*ready.lock(), 2);
}

#[test]
fn channel_subscribers_receive_events() {
    let mut test_store = TestStore::new();
    let rx = test_store.feed().subscribe();

    test_store.set("a", 1).unwrap();
    test_store.clear();

    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::set("a", Value::from(1)));
    assert_eq!(rx.try_recv().unwrap(), ChangeEvent::Clear);
    assert!(rx.try_recv().is_err());
}

#[test]
fn backup_is_a_byte_copy() {
    let mut test_store = TestStore::encrypted();
    test_store.set("a", 1).unwrap();
    let dest = test_store.sibling("backup.json");

    assert!(test_store.backup(&dest));
    assert_eq!(std::fs::read(&dest).unwrap(), test_store.read_raw());

    let restored = Store::open(Config::new().path(&dest).encryption_key(TEST_KEY)).unwrap();
    assert_eq!(restored.get("a"), Some(&Value::from(1)));
}

#[test]
fn backup_onto_own_file_keeps_data() {
    let mut test_store = TestStore::new();
    test_store.set("keep", 1).unwrap();
    let before = test_store.read_raw();
    let own = test_store.path().to_path_buf();

    assert!(test_store.backup(&own));
    assert!(test_store.backup(test_store.dir().join(".").join(STORE_FILE)));
    assert_eq!(test_store.read_raw(), before);

    test_store.reopen();
    assert_eq!(test_store.get("keep"), Some(&Value::from(1)));
}

#[test]
fn deep_paths_survive_reopen() {
    let deep = vec!["k"; 200].join(".");

    for mut test_store in [TestStore::new(), TestStore::encrypted()] {
        test_store.set("top", 1).unwrap();
        test_store.set(&deep, "deep").unwrap();
        test_store.reopen();

        assert_eq!(test_store.len(), 2);
        assert_eq!(test_store.get("top"), Some(&Value::from(1)));
        assert_eq!(test_store.get(&deep), Some(&Value::from("deep")));
    }
}

#[test]
fn debug_flag_only_changes_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let quiet = TestStore::new();
        let loud = TestStore::with_config(|config| config.debug(true));

        quiet.write_raw("garbage");
        loud.write_raw("garbage");

        assert!(quiet.open_again().is_empty());
        assert!(loud.open_again().is_empty());
        assert!(!quiet.backup(quiet.sibling("none").join("b.json")));
        assert!(!loud.backup(loud.sibling("none").join("b.json")));
    });
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn set_then_get_returns_value(key in key_strategy(4), value in value_strategy()) {
        with_temp_store(|store| {
            store.set(&key, value.clone()).unwrap();
            assert_eq!(store.get(&key), Some(&value));
        });
    }

    #[test]
    fn set_then_delete_removes(key in key_strategy(4), value in value_strategy()) {
        with_temp_store(|store| {
            store.set(&key, value).unwrap();
            assert!(store.delete(&key));
            assert!(!store.has(&key));
        });
    }

    #[test]
    fn disk_matches_memory_after_any_sequence(
        ops in operation_sequence_strategy(1, 24),
        encrypted in any::<bool>(),
    ) {
        let mut test_store = if encrypted { TestStore::encrypted() } else { TestStore::new() };
        for op in &ops {
            op.apply(&mut test_store);
        }

        let in_memory = test_store.all();
        test_store.reopen();
        prop_assert_eq!(test_store.all(), in_memory);
    }

    #[test]
    fn documents_survive_reopen(doc in document_strategy()) {
        let mut test_store = TestStore::encrypted();
        for (key, value) in &doc {
            test_store.set(key, value.clone()).unwrap();
        }

        test_store.reopen();
        prop_assert_eq!(test_store.all(), doc);
    }
}
