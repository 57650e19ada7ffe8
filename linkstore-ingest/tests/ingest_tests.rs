use std::sync::Arc;

use linkstore_ingest::{IngestConfig, IngestMode, IngestReport, Ingestor, LinkedPayload};
use linkstore_model::{CollectionType, Registry};
use linkstore_storage::{Store, StoreConfig};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_store() -> Store {
    init_tracing();
    Store::open_in_memory(Arc::new(Registry::standard())).unwrap()
}

fn inline(store: &Store) -> Ingestor {
    Ingestor::new(store.clone(), IngestConfig::inline())
}

fn payload(value: Value) -> LinkedPayload {
    serde_json::from_value(value).unwrap()
}

fn scenario() -> LinkedPayload {
    payload(json!({
        "users": [{"id": "42", "username": "foo"}],
        "posts": [{
            "id": "100",
            "author_id": "42",
            "links": {"author": {"id": "42", "type": "users"}}
        }]
    }))
}

// ── End to end ───────────────────────────────────────────────────

#[test]
fn post_resolves_its_author() {
    let store = make_store();
    let report = inline(&store).parse_linked_sync(&scenario());
    assert_eq!(report.written, 2);

    let post = store.read("100", CollectionType::Posts).expect("post stored");
    let author = post.get_link_object("author", &store);
    assert!(author.is_some());
    assert_eq!(author, store.read("42", CollectionType::Users));
    assert_eq!(author.unwrap().get_str("username"), Some("foo"));
}

#[test]
fn author_link_is_derived_without_links_section() {
    let store = make_store();
    inline(&store).parse_linked_sync(&payload(json!({
        "users": [{"id": "42", "username": "foo"}],
        "posts": [{"id": "100", "author_id": "42"}]
    })));

    let post = store.read("100", CollectionType::Posts).unwrap();
    assert_eq!(
        post.get_link_object("author", &store).and_then(|u| u.get_str("username").map(str::to_owned)),
        Some("foo".to_string())
    );
}

#[test]
fn full_response_with_linked_section() {
    let store = make_store();
    let response = json!({
        "posts": [{
            "id": "1",
            "title": "Hello",
            "links": {"comments": {"ids": ["c2", "c1", "c9"], "type": "comments"}}
        }],
        "meta": {"page": 1},
        "linked": {
            "comments": [
                {"id": "c1", "body": "first"},
                {"id": "c2", "body": "second"}
            ]
        }
    });
    let report = inline(&store).parse_linked_sync(&LinkedPayload::from_response(&response));
    assert_eq!(report.written, 3);

    let post = store.read("1", CollectionType::Posts).unwrap();
    let bodies: Vec<String> = post
        .get_link_array("comments", &store)
        .iter()
        .filter_map(|c| c.get_str("body").map(str::to_owned))
        .collect();
    assert_eq!(bodies, vec!["second", "first"]);
}

// ── Idempotence and merge ────────────────────────────────────────

#[test]
fn ingesting_twice_equals_once() {
    let once = make_store();
    inline(&once).parse_linked_sync(&scenario());

    let twice = make_store();
    let ingestor = inline(&twice);
    ingestor.parse_linked_sync(&scenario());
    ingestor.parse_linked_sync(&scenario());

    for (id, collection) in [("42", CollectionType::Users), ("100", CollectionType::Posts)] {
        assert_eq!(once.read(id, collection), twice.read(id, collection));
    }
    assert_eq!(twice.count(CollectionType::Users), 1);
}

#[test]
fn sparse_page_keeps_known_relations_and_fields() {
    let store = make_store();
    let ingestor = inline(&store);
    ingestor.parse_linked_sync(&payload(json!({
        "posts": [{
            "id": "1",
            "title": "Full",
            "excerpt": "An excerpt",
            "links": {"comments": {"ids": ["a", "b"], "type": "comments"}}
        }]
    })));
    // A feed page carries a thinner representation of the same post.
    ingestor.parse_linked_sync(&payload(json!({
        "posts": [{"id": "1", "title": "Renamed"}]
    })));

    let post = store.read("1", CollectionType::Posts).unwrap();
    assert_eq!(post.get_str("title"), Some("Renamed"));
    assert_eq!(post.get_str("excerpt"), Some("An excerpt"));
    assert_eq!(post.link("comments").map(|l| l.keys().len()), Some(2));
}

#[test]
fn duplicates_in_one_batch_merge_in_order() {
    let store = make_store();
    inline(&store).parse_linked_sync(&payload(json!({
        "tags": [
            {"id": "t", "name": "old", "usage_count": 1},
            {"id": "t", "name": "new", "usage_count": 2}
        ]
    })));
    let tag = store.read("t", CollectionType::Tags).unwrap();
    assert_eq!(tag.get_str("name"), Some("new"));
    assert_eq!(store.count(CollectionType::Tags), 1);
}

// ── Tolerance ────────────────────────────────────────────────────

#[test]
fn unknown_collection_is_skipped() {
    let store = make_store();
    let report = inline(&store).parse_linked_sync(&payload(json!({
        "users": [{"id": "42", "username": "foo"}],
        "widgets": [{"id": "1"}]
    })));
    assert_eq!(
        report,
        IngestReport {
            written: 1,
            skipped_unknown_collections: 1,
            ..IngestReport::default()
        }
    );
    assert!(store.contains("42", CollectionType::Users));
}

#[test]
fn malformed_objects_are_skipped() {
    let store = make_store();
    let report = inline(&store).parse_linked_sync(&payload(json!({
        "users": [
            {"username": "no id"},
            {"id": "", "username": "empty id"},
            {"id": true},
            "not an object",
            {"id": 7, "username": "numeric"},
            {"id": "8", "username": "fine"}
        ]
    })));
    assert_eq!(report.written, 2);
    assert_eq!(report.skipped_malformed, 4);
    assert_eq!(
        store.read("7", CollectionType::Users).unwrap().get_str("username"),
        Some("numeric")
    );
    assert!(store.contains("8", CollectionType::Users));
}

#[test]
fn empty_payload_writes_nothing() {
    let store = make_store();
    let report = inline(&store).parse_linked_sync(&LinkedPayload::new());
    assert_eq!(report, IngestReport::default());
}

#[test]
fn unavailable_store_drops_writes() {
    let store = Store::open(
        &StoreConfig {
            directory: None,
            ..StoreConfig::default()
        },
        Arc::new(Registry::standard()),
    );
    let report = inline(&store).parse_linked_sync(&scenario());
    assert_eq!(report.written, 0);
    assert_eq!(report.failed, 2);
    assert_eq!(store.read("100", CollectionType::Posts), None);
}

// ── Execution modes ──────────────────────────────────────────────

#[test]
fn inline_completion_runs_before_return() {
    let store = make_store();
    let (tx, rx) = std::sync::mpsc::channel();
    inline(&store).parse_linked_with(scenario(), move |report| {
        tx.send(report).unwrap();
    });
    assert_eq!(rx.try_recv().unwrap().written, 2);
    assert!(store.contains("100", CollectionType::Posts));
}

#[tokio::test]
async fn background_parse_resolves_after_writes() {
    let store = make_store();
    let ingestor = Ingestor::new(store.clone(), IngestConfig::default());
    assert_eq!(ingestor.config().mode, IngestMode::Background);

    let report = ingestor.parse_linked(scenario()).await;
    assert_eq!(report.written, 2);
    assert!(store.contains("42", CollectionType::Users));
}

#[tokio::test]
async fn background_completion_follows_last_write() {
    let store = make_store();
    let ingestor = Ingestor::new(store.clone(), IngestConfig::default());
    let (tx, rx) = tokio::sync::oneshot::channel();

    let observer = store.clone();
    ingestor.parse_linked_with(scenario(), move |report| {
        let visible = observer.contains("100", CollectionType::Posts) && observer.contains("42", CollectionType::Users);
        let _ = tx.send((report, visible));
    });

    let (report, visible) = rx.await.unwrap();
    assert_eq!(report.written, 2);
    assert!(visible);
}

#[test]
fn background_completion_without_runtime() {
    let store = make_store();
    let ingestor = Ingestor::new(store.clone(), IngestConfig::default());
    let (tx, rx) = std::sync::mpsc::channel();
    ingestor.parse_linked_with(scenario(), move |report| {
        tx.send(report).unwrap();
    });
    assert_eq!(rx.recv().unwrap().written, 2);
}

#[test]
fn config_round_trips_through_json() {
    let config: IngestConfig = serde_json::from_value(json!({"mode": "inline"})).unwrap();
    assert_eq!(config, IngestConfig::inline());
    let config: IngestConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(config.mode, IngestMode::Background);
}
