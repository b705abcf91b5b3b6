use coffer::{KvStore, SqliteKvStore, VisibilityStore};
use tempfile::NamedTempFile;

#[test]
fn toggle_round_trips_through_the_sqlite_store() {
    let tmp = NamedTempFile::new().expect("temp store file should create");

    {
        let kv = SqliteKvStore::open(tmp.path()).expect("store should open");
        let mut store = VisibilityStore::load(Box::new(kv));
        assert!(!store.is_hidden(4151));
        assert!(store.toggle(4151));
    }

    let kv = SqliteKvStore::open(tmp.path()).expect("store should reopen");
    let mut store = VisibilityStore::load(Box::new(kv));
    assert!(store.is_hidden(4151));

    assert!(!store.toggle(4151));

    let kv = SqliteKvStore::open(tmp.path()).expect("store should reopen again");
    let store = VisibilityStore::load(Box::new(kv));
    assert!(!store.is_hidden(4151));
}

#[test]
fn every_mutation_persists_the_full_map() {
    let tmp = NamedTempFile::new().expect("temp store file should create");

    {
        let kv = SqliteKvStore::open(tmp.path()).expect("store should open");
        let mut store = VisibilityStore::load(Box::new(kv));
        store.toggle(2);
        store.toggle(6);
        store.toggle(2);
    }

    let kv = SqliteKvStore::open(tmp.path()).expect("store should reopen");
    let store = VisibilityStore::load(Box::new(kv));
    assert!(!store.is_hidden(2));
    assert!(store.is_hidden(6));
    // The flipped-back entry is kept, not pruned.
    assert_eq!(store.map().len(), 2);
}

#[test]
fn corrupt_persisted_payload_degrades_to_an_empty_map() {
    let tmp = NamedTempFile::new().expect("temp store file should create");

    let kv = SqliteKvStore::open(tmp.path()).expect("store should open");
    kv.set("hidden_items", "][ not json").expect("set should work");

    let store = VisibilityStore::load(Box::new(kv));
    assert!(store.map().is_empty());
}

#[test]
fn kv_set_overwrites_in_place() {
    let tmp = NamedTempFile::new().expect("temp store file should create");
    let kv = SqliteKvStore::open(tmp.path()).expect("store should open");

    assert_eq!(kv.get("hidden_items").unwrap(), None);
    kv.set("hidden_items", "a").unwrap();
    kv.set("hidden_items", "b").unwrap();
    assert_eq!(kv.get("hidden_items").unwrap().as_deref(), Some("b"));
}
