//! Tests for customization export.

use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::context::{AppInfo, SiteContext};
use crate::db::{MetadataStore, Row, SqliteStore};
use crate::sync::{ExportOptions, export_customizations, read_bundle};

async fn setup_ctx() -> SiteContext<SqliteStore> {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    SiteContext::new(store, AppInfo::new("my_app", "/tmp/my_app"))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

async fn insert(ctx: &SiteContext<SqliteStore>, doctype: &str, value: Value) {
    ctx.store.raw_insert(doctype, &row(value)).await.unwrap();
}

async fn add_doctype(ctx: &SiteContext<SqliteStore>, name: &str, custom: i64) {
    insert(
        ctx,
        "DocType",
        json!({"name": name, "module": "Projects", "custom": custom}),
    )
    .await;
}

fn doctypes(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|n| n.to_string()).collect())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_task_custom_field() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    insert(
        &ctx,
        "Custom Field",
        json!({
            "name": "Task-due_priority",
            "dt": "Task",
            "fieldname": "due_priority",
            "fieldtype": "Select",
            "options": "Low\nHigh",
        }),
    )
    .await;

    let summary = export_customizations(
        &ctx,
        doctypes(&["Task"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.doctypes_scanned, 1);
    assert_eq!(summary.custom_fields, 1);
    assert_eq!(summary.total_records(), 1);

    let bundle = read_bundle(&temp_dir.path().join("Task.json")).unwrap();
    assert_eq!(bundle.custom_fields.len(), 1);
    assert_eq!(bundle.custom_fields[0].fieldname, "due_priority");
    assert_eq!(bundle.custom_fields[0].extra["fieldtype"], "Select");
    assert!(bundle.property_setters.is_empty());
    assert!(bundle.client_scripts.is_empty());
    assert!(bundle.server_scripts.is_empty());
    assert!(bundle.custom_perms.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_skips_empty_bundles() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("customizations");

    let summary = export_customizations(
        &ctx,
        doctypes(&["Project"]),
        &output,
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.skipped, vec!["Project".to_string()]);
    assert!(summary.files_written.is_empty());
    assert!(output.is_dir());
    assert!(!output.join("Project.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_defaults_to_non_custom_doctypes() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    add_doctype(&ctx, "Task", 0).await;
    add_doctype(&ctx, "Site Specific", 1).await;
    for dt in ["Task", "Site Specific"] {
        insert(
            &ctx,
            "Custom Field",
            json!({"name": format!("{}-x", dt), "dt": dt, "fieldname": "x"}),
        )
        .await;
    }

    let summary = export_customizations(&ctx, None, temp_dir.path(), &ExportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.doctypes_scanned, 1);
    assert!(temp_dir.path().join("Task.json").exists());
    assert!(!temp_dir.path().join("Site Specific.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_orders_fields_by_idx() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    for (fieldname, idx) in [("second", 2), ("first", 1), ("third", 3)] {
        insert(
            &ctx,
            "Custom Field",
            json!({
                "name": format!("Task-{}", fieldname),
                "dt": "Task",
                "fieldname": fieldname,
                "idx": idx,
            }),
        )
        .await;
    }

    export_customizations(
        &ctx,
        doctypes(&["Task"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    let bundle = read_bundle(&temp_dir.path().join("Task.json")).unwrap();
    let order: Vec<&str> = bundle
        .custom_fields
        .iter()
        .map(|f| f.fieldname.as_str())
        .collect();
    assert_eq!(order, vec!["first", "second", "third"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scripts_match_whole_list_by_default() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    insert(
        &ctx,
        "Client Script",
        json!({"name": "Task Form", "dt": "Task", "enabled": 1}),
    )
    .await;
    insert(
        &ctx,
        "Server Script",
        json!({"name": "Project Hook", "reference_doctype": "Project", "script_type": "DocType Event"}),
    )
    .await;

    export_customizations(
        &ctx,
        doctypes(&["Task", "Project"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    for file in ["Task.json", "Project.json"] {
        let bundle = read_bundle(&temp_dir.path().join(file)).unwrap();
        assert_eq!(bundle.client_scripts.len(), 1, "{}", file);
        assert_eq!(bundle.server_scripts.len(), 1, "{}", file);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scripts_scoped_to_doctype() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    insert(
        &ctx,
        "Client Script",
        json!({"name": "Task Form", "dt": "Task", "enabled": 1}),
    )
    .await;
    insert(
        &ctx,
        "Server Script",
        json!({"name": "Project Hook", "reference_doctype": "Project"}),
    )
    .await;

    let options = ExportOptions {
        scope_scripts_to_doctype: true,
    };
    export_customizations(
        &ctx,
        doctypes(&["Task", "Project"]),
        temp_dir.path(),
        &options,
    )
    .await
    .unwrap();

    let task = read_bundle(&temp_dir.path().join("Task.json")).unwrap();
    assert_eq!(task.client_scripts.len(), 1);
    assert!(task.server_scripts.is_empty());

    let project = read_bundle(&temp_dir.path().join("Project.json")).unwrap();
    assert!(project.client_scripts.is_empty());
    assert_eq!(project.server_scripts.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_perms_ordered_by_name() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    for (name, role) in [("perm-b", "Projects User"), ("perm-a", "Projects Manager")] {
        insert(
            &ctx,
            "Custom DocPerm",
            json!({"name": name, "parent": "Task", "role": role, "read": 1}),
        )
        .await;
    }

    export_customizations(
        &ctx,
        doctypes(&["Task"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    let bundle = read_bundle(&temp_dir.path().join("Task.json")).unwrap();
    let names: Vec<&str> = bundle
        .custom_perms
        .iter()
        .filter_map(|p| p.name.as_deref())
        .collect();
    assert_eq!(names, vec!["perm-a", "perm-b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_overwrites_existing_file() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Task.json"), "stale").unwrap();
    insert(
        &ctx,
        "Property Setter",
        json!({
            "name": "Task-subject-reqd",
            "doc_type": "Task",
            "field_name": "subject",
            "property": "reqd",
            "value": "1",
        }),
    )
    .await;

    export_customizations(
        &ctx,
        doctypes(&["Task"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    let bundle = read_bundle(&temp_dir.path().join("Task.json")).unwrap();
    assert_eq!(bundle.property_setters.len(), 1);
    assert_eq!(bundle.property_setters[0].property, "reqd");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_continues_after_write_failure() {
    let ctx = setup_ctx().await;
    let temp_dir = TempDir::new().unwrap();
    for dt in ["Alpha", "Beta"] {
        insert(
            &ctx,
            "Custom Field",
            json!({"name": format!("{}-extra", dt), "dt": dt, "fieldname": "extra"}),
        )
        .await;
    }
    // A directory where Alpha.json should go makes that write fail.
    fs::create_dir(temp_dir.path().join("Alpha.json")).unwrap();

    let summary = export_customizations(
        &ctx,
        doctypes(&["Alpha", "Beta"]),
        temp_dir.path(),
        &ExportOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.doctypes_scanned, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "Alpha");
    assert_eq!(summary.files_written, vec![temp_dir.path().join("Beta.json")]);
    assert_eq!(summary.custom_fields, 1);

    let bundle = read_bundle(&temp_dir.path().join("Beta.json")).unwrap();
    assert_eq!(bundle.custom_fields.len(), 1);
}
