use std::sync::Arc;

use linkstore_model::{CollectionType, Entity, EntityKey, FieldValue, Registry, kinds};
use linkstore_storage::{Store, StorageError, WriteOutcome};
use pretty_assertions::assert_eq;

fn make_store() -> Store {
    Store::open_in_memory(Arc::new(Registry::standard())).unwrap()
}

fn post(id: &str, title: &str) -> Entity {
    kinds::posts().new_entity(id).with_field("title", title)
}

// ── Basic read/write ─────────────────────────────────────────────

#[test]
fn read_missing_is_none() {
    let store = make_store();
    assert_eq!(store.read("nope", CollectionType::Posts), None);
    assert!(!store.contains("nope", CollectionType::Posts));
}

#[test]
fn write_then_read() {
    let store = make_store();
    let p = post("100", "Hello");
    assert_eq!(store.try_write(p.clone()).unwrap(), WriteOutcome::Inserted);
    assert_eq!(store.read("100", CollectionType::Posts), Some(p));
    assert!(store.contains("100", CollectionType::Posts));
}

#[test]
fn collections_are_separate_partitions() {
    let store = make_store();
    store.write(post("1", "post"));
    store.write(kinds::users().new_entity("1").with_field("username", "u"));

    assert_eq!(store.read("1", CollectionType::Posts).unwrap().get_str("title"), Some("post"));
    assert_eq!(store.read("1", CollectionType::Users).unwrap().get_str("username"), Some("u"));
    assert_eq!(store.count(CollectionType::Posts), 1);
    assert_eq!(store.count(CollectionType::Users), 1);
    assert_eq!(store.count(CollectionType::Comments), 0);
}

#[test]
fn second_write_reports_merge() {
    let store = make_store();
    store.write(post("1", "A"));
    assert_eq!(store.try_write(post("1", "B")).unwrap(), WriteOutcome::Merged);
    assert_eq!(store.count(CollectionType::Posts), 1);
}

#[test]
fn try_read_surfaces_results() {
    let store = make_store();
    store.write(post("1", "A"));
    let key = EntityKey::new(CollectionType::Posts, "1");
    assert!(store.try_read(&key).unwrap().is_some());
}

// ── Merge on write ───────────────────────────────────────────────

#[test]
fn merge_preserves_protected_relation() {
    let store = make_store();
    let mut existing = post("1", "A");
    existing.add_link_array("comments", ["c1", "c2", "c3"], CollectionType::Comments);
    store.write(existing.clone());

    // Sparse page: same post without its comments relation.
    store.write(post("1", "A"));

    let stored = store.read("1", CollectionType::Posts).unwrap();
    assert_eq!(stored.link("comments"), existing.link("comments"));
}

#[test]
fn merge_overwrites_unprotected_field() {
    let store = make_store();
    store.write(post("1", "A"));
    store.write(post("1", "B"));
    assert_eq!(store.read("1", CollectionType::Posts).unwrap().get_str("title"), Some("B"));
}

#[test]
fn merge_keeps_protected_scalar() {
    let store = make_store();
    store.write(
        kinds::users()
            .new_entity("42")
            .with_field("username", "foo")
            .with_field("bio", "long bio"),
    );
    store.write(kinds::users().new_entity("42").with_field("username", "foo2"));

    let user = store.read("42", CollectionType::Users).unwrap();
    assert_eq!(user.get_str("username"), Some("foo2"));
    assert_eq!(user.get_str("bio"), Some("long bio"));
}

#[test]
fn unprotected_nullable_field_is_cleared() {
    let store = make_store();
    store.write(post("1", "A").with_field("author_id", "42"));
    store.write(post("1", "A"));
    assert_eq!(
        store.read("1", CollectionType::Posts).unwrap().field("author_id"),
        Some(&FieldValue::Null)
    );
}

#[test]
fn merges_apply_in_arrival_order() {
    let store = make_store();
    for title in ["one", "two", "three"] {
        store.write(post("1", title));
    }
    assert_eq!(store.read("1", CollectionType::Posts).unwrap().get_str("title"), Some("three"));
}

// ── Transactions ─────────────────────────────────────────────────

#[test]
fn transaction_writes_are_visible_inside_and_after() {
    let store = make_store();
    let seen = store
        .writer()
        .transaction(|tx| {
            tx.write(post("1", "A"))?;
            tx.write(post("2", "B"))?;
            tx.read(&EntityKey::new(CollectionType::Posts, "1"))
        })
        .unwrap();
    assert_eq!(seen.unwrap().get_str("title"), Some("A"));
    assert_eq!(store.count(CollectionType::Posts), 2);
}

#[test]
fn failed_transaction_keeps_nothing() {
    let store = make_store();
    let result: Result<(), _> = store.writer().transaction(|tx| {
        tx.write(post("1", "A"))?;
        Err(StorageError::Unregistered("test".into()))
    });
    assert!(result.is_err());
    assert_eq!(store.read("1", CollectionType::Posts), None);
}

#[test]
fn write_of_unregistered_collection_fails() {
    let store = Store::open_in_memory(Arc::new(Registry::new())).unwrap();
    let err = store.try_write(post("1", "A")).unwrap_err();
    assert!(matches!(err, StorageError::Unregistered(_)));
    // Infallible variant only logs.
    store.write(post("1", "A"));
    assert_eq!(store.read("1", CollectionType::Posts), None);
}

// ── Link resolution through the store ────────────────────────────

#[test]
fn link_object_resolves_through_store() {
    let store = make_store();
    let author = kinds::users().new_entity("42").with_field("username", "foo");
    store.write(author.clone());
    let mut p = post("100", "Hi");
    p.add_link_object("author", "42", CollectionType::Users);
    store.write(p);

    let p = store.read("100", CollectionType::Posts).unwrap();
    assert_eq!(p.get_link_object("author", &store), Some(author));
}

#[test]
fn link_array_keeps_order_and_prunes_missing() {
    let store = make_store();
    let a = kinds::comments().new_entity("a").with_field("body", "first");
    let c = kinds::comments().new_entity("c").with_field("body", "third");
    store.write(c.clone());
    store.write(a.clone());

    let mut p = post("1", "x");
    p.add_link_array("comments", ["a", "b", "c"], CollectionType::Comments);

    assert_eq!(p.get_link_array("comments", &store), vec![a, c]);
}

#[test]
fn link_resolution_sees_later_writes() {
    let store = make_store();
    let mut p = post("1", "x");
    p.add_link_object("author", "42", CollectionType::Users);
    assert_eq!(p.get_link_object("author", &store), None);

    store.write(kinds::users().new_entity("42"));
    assert!(p.get_link_object("author", &store).is_some());
}
