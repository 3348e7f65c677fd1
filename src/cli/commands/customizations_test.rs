use std::fs;

use serde_json::json;
use tempfile::TempDir;

use crate::cli::commands::customizations::*;
use crate::context::{AppInfo, SiteContext};
use crate::db::{Filter, MetadataStore, SqliteStore};

async fn setup_ctx(app_path: &std::path::Path) -> SiteContext<SqliteStore> {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    SiteContext::new(store, AppInfo::new("my_app", app_path))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_defaults_to_app_customizations_dir() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;
    let row = json!({"name": "Task-due_priority", "dt": "Task", "fieldname": "due_priority"});
    ctx.store
        .raw_insert("Custom Field", row.as_object().unwrap())
        .await
        .unwrap();

    let output = export(&ctx, "Task", None, false).await.unwrap();

    assert!(output.contains("Exported 1 file(s)"));
    assert!(output.contains("Custom Fields"));
    assert!(
        temp_dir
            .path()
            .join("customizations")
            .join("Task.json")
            .exists()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_reports_files() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;
    let dir = temp_dir.path().join("customizations");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("Task.json"),
        r#"{"custom_fields": [{"dt": "Task", "fieldname": "due_priority"}],
            "custom_perms": [{"parent": "Task", "role": "Guest", "read": 1}]}"#,
    )
    .unwrap();

    let output = import(&ctx, None, false, false).await.unwrap();

    assert!(output.contains("Imported 1 file(s) from customizations"));
    assert!(output.contains("Task.json"));
    assert!(output.contains("1 replaced (0 removed)"));
    let fields = ctx
        .store
        .get_all("Custom Field", &Filter::new(), None)
        .await
        .unwrap();
    assert_eq!(fields.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_lists_failures_with_keep_going() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;
    fs::write(temp_dir.path().join("Broken.json"), "not json").unwrap();

    let output = import(&ctx, Some(temp_dir.path()), true, false)
        .await
        .unwrap();

    assert!(output.contains("1 file(s) failed"));
    assert!(output.contains("Broken.json"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = setup_ctx(temp_dir.path()).await;

    let output = import(&ctx, Some(temp_dir.path()), false, false)
        .await
        .unwrap();

    assert!(output.contains("No customization files found."));
}

#[test]
fn test_export_summary_lists_failed_doctypes() {
    let summary = crate::sync::ExportSummary {
        doctypes_scanned: 2,
        failed: vec![("Alpha".to_string(), "Is a directory".to_string())],
        ..Default::default()
    };

    let output = format_export_summary(&summary, std::path::Path::new("out"));

    assert!(output.contains("✗ 1 DocType(s) failed"));
    assert!(output.contains("Alpha: Is a directory"));
}
