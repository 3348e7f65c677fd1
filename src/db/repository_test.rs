//! Tests for the provided `MetadataStore` methods, run against SQLite.

use serde_json::json;

use crate::db::{DbError, Filter, MetadataStore, OrderBy, Row, SqliteStore, UpsertOutcome};

async fn setup_store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    store
}

fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_upsert_inserts_then_updates() {
    let store = setup_store().await;
    let identity = Filter::new().eq("dt", "Task").eq("fieldname", "due_priority");
    let values = row(json!({
        "name": "Task-due_priority",
        "dt": "Task",
        "fieldname": "due_priority",
        "label": "Due Priority",
    }));

    let first = store
        .raw_upsert("Custom Field", Some(&identity), values.clone(), "Administrator")
        .await
        .unwrap();
    assert_eq!(first, UpsertOutcome::Inserted);

    let mut changed = values.clone();
    changed.insert("label".into(), "Priority (Due)".into());
    let second = store
        .raw_upsert("Custom Field", Some(&identity), changed, "Administrator")
        .await
        .unwrap();
    assert_eq!(second, UpsertOutcome::Updated);

    let rows = store
        .get_all("Custom Field", &Filter::new(), None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["label"], "Priority (Due)");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_upsert_stamps_inserts() {
    let store = setup_store().await;
    let values = row(json!({
        "name": "abc123def0",
        "parent": "Task",
        "role": "Projects User",
    }));

    store
        .raw_upsert("Custom DocPerm", None, values, "ops@example.com")
        .await
        .unwrap();

    let doc = store.get_doc("Custom DocPerm", "abc123def0").await.unwrap();
    assert_eq!(doc["owner"], "ops@example.com");
    assert_eq!(doc["modified_by"], "ops@example.com");
    assert!(doc["creation"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_upsert_without_identity_always_inserts() {
    let store = setup_store().await;

    for name in ["perm000001", "perm000002"] {
        let values = row(json!({"name": name, "parent": "Task", "role": "Guest"}));
        let outcome = store
            .raw_upsert("Custom DocPerm", None, values, "Administrator")
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }

    let names = store
        .get_names(
            "Custom DocPerm",
            &Filter::new().eq("parent", "Task"),
            Some(&OrderBy::asc("name")),
        )
        .await
        .unwrap();
    assert_eq!(names, vec!["perm000001", "perm000002"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_doc_not_found() {
    let store = setup_store().await;

    let result = store.get_doc("DocType", "Missing").await;

    assert!(matches!(result, Err(DbError::NotFound { .. })));
}
