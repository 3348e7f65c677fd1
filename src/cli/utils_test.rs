use std::path::Path;

use crate::cli::utils::*;

#[test]
fn test_parse_doctypes_empty() {
    assert_eq!(parse_doctypes(""), None);
    assert_eq!(parse_doctypes(" , ,"), None);
}

#[test]
fn test_parse_doctypes_trims_and_drops_empty() {
    let result = parse_doctypes("Task, Project,,Sales Invoice ");
    assert_eq!(
        result,
        Some(vec![
            "Task".to_string(),
            "Project".to_string(),
            "Sales Invoice".to_string()
        ])
    );
}

#[test]
fn test_display_path_relative_to_base() {
    let base = Path::new("/bench/apps/my_app/my_app");
    let path = base.join("customizations/Task.json");
    assert_eq!(display_path(&path, base), "customizations/Task.json");
}

#[test]
fn test_display_path_outside_base() {
    let base = Path::new("/bench/apps/my_app/my_app");
    assert_eq!(
        display_path(Path::new("/tmp/Task.json"), base),
        "/tmp/Task.json"
    );
}
