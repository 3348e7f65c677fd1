use serde_json::{Value, json};
use tempfile::TempDir;

use crate::cli::commands::docs::*;
use crate::context::{AppInfo, SiteContext};
use crate::db::{MetadataStore, SqliteStore};

async fn setup_ctx(app_path: &std::path::Path) -> SiteContext<SqliteStore> {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    SiteContext::new(store, AppInfo::new("my_app", app_path))
}

async fn insert(ctx: &SiteContext<SqliteStore>, doctype: &str, value: Value) {
    ctx.store
        .raw_insert(doctype, value.as_object().unwrap())
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_all_docs_without_doctypes() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;

    let output = export_all_docs(&ctx).await.unwrap();

    assert!(output.contains("No doctypes found for my_app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_quick_export_writes_definitions_and_customizations() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;
    insert(
        &ctx,
        "Module Def",
        json!({"name": "Projects", "app_name": "my_app"}),
    )
    .await;
    insert(
        &ctx,
        "DocType",
        json!({"name": "Project Task", "module": "Projects", "custom": 0}),
    )
    .await;
    insert(
        &ctx,
        "Property Setter",
        json!({
            "name": "Project Task-subject-bold",
            "doc_type": "Project Task",
            "field_name": "subject",
            "property": "bold",
            "value": "1",
        }),
    )
    .await;

    let output = quick_export(&ctx).await.unwrap();

    assert!(output.contains("Exported 1 of 1 doctypes"));
    assert!(output.contains("projects/doctype/project_task/project_task.json"));
    assert!(
        temp_dir
            .path()
            .join("projects/doctype/project_task/project_task.json")
            .exists()
    );
    assert!(
        temp_dir
            .path()
            .join("customizations/Project Task.json")
            .exists()
    );
}
