mod common;

use common::{entry, key, TagCodec};
use tartarus::io::MemoryBuffer;
use tartarus::migration::{LATEST, V1};
use tartarus::{
    Codec, Description, Identity, JsonStore, MigratableStore, PatternQuery, Plaintext, Query,
    Store,
};

fn store() -> JsonStore<TagCodec> {
    let mut store = JsonStore::new(TagCodec::new("MAIN", &["MAIN"]));
    store.init(&mut MemoryBuffer::default()).unwrap();
    store
}

fn lookup(description: &str, identity: Option<&str>) -> Query {
    Query::lookup(
        Description::new(description).unwrap(),
        identity.map(|i| Identity::new(i).unwrap()),
    )
}

#[test]
fn test_query_by_description_and_identity() {
    let mut store = store();
    let github_alice = entry(store.codec(), "github.com", Some("alice"), "hunter2");
    let github_bob = entry(store.codec(), "github.com", Some("bob"), "correct horse");
    let gitlab = entry(store.codec(), "gitlab.com", Some("alice"), "battery staple");

    for e in [&github_alice, &github_bob, &gitlab] {
        store.put(e.clone()).unwrap();
    }

    let results = store.query(&lookup("github.com", None)).unwrap();
    assert_eq!(results, vec![github_alice.clone(), github_bob.clone()]);

    let results = store.query(&lookup("github.com", Some("bob"))).unwrap();
    assert_eq!(results, vec![github_bob.clone()]);
    let secret = store.codec().decode(results[0].ciphertext()).unwrap();
    assert_eq!(secret.as_str(), "correct horse");

    assert!(store
        .query(&lookup("bitbucket.org", None))
        .unwrap()
        .is_empty());

    let results = store.query(&PatternQuery::containing("GIT")).unwrap();
    assert_eq!(results.len(), 3);
    let results = store.query(&PatternQuery::containing("lab")).unwrap();
    assert_eq!(results, vec![gitlab]);
}

#[test]
fn test_empty_query_matches_everything() {
    let mut store = store();
    store
        .put(entry(store.codec(), "a.example", None, "1"))
        .unwrap();
    store
        .put(entry(store.codec(), "b.example", None, "2"))
        .unwrap();

    assert_eq!(
        store.query(&Query::new()).unwrap(),
        store.select_all().unwrap()
    );
}

#[test]
fn test_put_replaces_and_remove_deletes() {
    let mut store = store();
    let original = entry(store.codec(), "example.org", Some("carol"), "old");
    store.put(original.clone()).unwrap();
    assert_eq!(store.get_count().unwrap(), 1);

    let replacement = original.reencrypted(
        key("MAIN"),
        store.codec().encode(&Plaintext::new("new")).unwrap(),
    );
    store.put(replacement.clone()).unwrap();
    assert_eq!(store.get_count().unwrap(), 1);
    assert_eq!(store.select_all().unwrap(), vec![replacement.clone()]);

    store.remove(&replacement).unwrap();
    assert_eq!(store.get_count().unwrap(), 0);

    // Removing an absent entry is not an error.
    store.remove(&original).unwrap();
}

#[test]
fn test_count_of_key_id() {
    let mut store = store();
    let other = TagCodec::new("OTHER", &["OTHER"]);

    store.put(entry(store.codec(), "one", None, "1")).unwrap();
    store.put(entry(store.codec(), "two", None, "2")).unwrap();
    store.put(entry(&other, "three", None, "3")).unwrap();

    assert_eq!(store.get_count().unwrap(), 3);
    assert_eq!(store.get_count_of_key_id(&key("MAIN")).unwrap(), 2);
    assert_eq!(store.get_count_of_key_id(&key("OTHER")).unwrap(), 1);
    assert_eq!(store.get_count_of_key_id(&key("NONE")).unwrap(), 0);
}

#[test]
fn test_sync_writes_once_and_reloads() {
    let mut store = store();
    store
        .put(entry(store.codec(), "github.com", Some("alice"), "hunter2"))
        .unwrap();

    let mut buffer = MemoryBuffer::default();
    store.sync(&mut buffer).unwrap();
    assert_eq!(buffer.write_count(), 1);

    let mut reloaded = JsonStore::new(TagCodec::new("MAIN", &["MAIN"]));
    reloaded
        .init(&mut MemoryBuffer::new(buffer.contents().to_vec()))
        .unwrap();
    assert_eq!(reloaded.select_all().unwrap(), store.select_all().unwrap());
    assert_eq!(reloaded.current_schema_version(), LATEST);
}

#[test]
fn test_second_init_replaces_state() {
    let mut store = store();
    store.put(entry(store.codec(), "stale", None, "x")).unwrap();

    store
        .init(&mut MemoryBuffer::new(
            r#"[{"id": "n1", "key_id": "MAIN", "timestamp": "2024-01-01T00:00",
                 "description": "fresh", "ciphertext": ""}]"#,
        ))
        .unwrap();

    let all = store.select_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].description().as_str(), "fresh");
    assert_eq!(store.current_schema_version(), V1);
}
