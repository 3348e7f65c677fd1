use serde_json::{Value, json};

use crate::db::{
    ClientScript, Condition, CustomDocPerm, CustomField, Customization, Filter, PropertySetter,
    ServerScript, UpsertOutcome,
};

fn custom_field() -> CustomField {
    serde_json::from_value(json!({
        "name": "Task-due_priority",
        "dt": "Task",
        "fieldname": "due_priority",
        "label": "Due Priority",
        "fieldtype": "Select",
        "idx": 7,
        "reqd": 0,
        "modified": "2024-03-01 09:30:00",
        "depends_on": null,
    }))
    .unwrap()
}

#[test]
fn test_custom_field_keeps_unknown_columns() {
    let field = custom_field();

    assert_eq!(field.dt, "Task");
    assert_eq!(field.fieldname, "due_priority");
    assert_eq!(field.extra["label"], "Due Priority");
    assert_eq!(field.extra["idx"], 7);
    assert_eq!(field.extra["depends_on"], Value::Null);

    let row = field.to_row().unwrap();
    assert_eq!(row["name"], "Task-due_priority");
    assert_eq!(row["dt"], "Task");
    assert_eq!(row["modified"], "2024-03-01 09:30:00");
    assert_eq!(row.len(), 9);
}

#[test]
fn test_custom_field_identity_and_autoname() {
    let field = custom_field();

    assert_eq!(
        field.identity(),
        Some(Filter::new().eq("dt", "Task").eq("fieldname", "due_priority"))
    );
    assert_eq!(field.autoname(), "Task-due_priority");
    assert_eq!(field.label(), "Task.due_priority");
}

#[test]
fn test_custom_field_requires_identity_keys() {
    let result: Result<CustomField, _> = serde_json::from_value(json!({
        "dt": "Task",
        "label": "No fieldname",
    }));
    assert!(result.is_err());
}

#[test]
fn test_property_setter_doctype_level() {
    let setter: PropertySetter = serde_json::from_value(json!({
        "doc_type": "Task",
        "field_name": null,
        "property": "sort_field",
        "value": "modified",
        "doctype_or_field": "DocType",
    }))
    .unwrap();

    assert_eq!(setter.autoname(), "Task-sort_field");
    let identity = setter.identity().unwrap();
    assert_eq!(
        identity.conditions[1],
        Condition::Eq {
            field: "field_name".to_string(),
            value: Value::Null,
        }
    );
}

#[test]
fn test_property_setter_field_level_autoname() {
    let setter: PropertySetter = serde_json::from_value(json!({
        "doc_type": "Task",
        "field_name": "subject",
        "property": "reqd",
        "value": "1",
    }))
    .unwrap();

    assert_eq!(setter.autoname(), "Task-subject-reqd");
    assert_eq!(setter.label(), "Task.subject");
}

#[test]
fn test_scripts_identity_is_name_only() {
    let named: ClientScript = serde_json::from_value(json!({
        "name": "Task Form",
        "dt": "Task",
        "script": "frappe.ui.form.on('Task', {})",
    }))
    .unwrap();
    assert_eq!(named.identity(), Some(Filter::new().eq("name", "Task Form")));

    let unnamed: ServerScript = serde_json::from_value(json!({
        "reference_doctype": "Task",
        "script_type": "DocType Event",
    }))
    .unwrap();
    assert_eq!(unnamed.identity(), None);
    assert_eq!(unnamed.label(), "<unnamed>");
    assert_eq!(unnamed.autoname().len(), 10);
}

#[test]
fn test_custom_docperm_has_no_identity() {
    let perm: CustomDocPerm = serde_json::from_value(json!({
        "name": "a1b2c3d4e5",
        "parent": "Task",
        "role": "Projects User",
        "read": 1,
    }))
    .unwrap();

    assert_eq!(perm.identity(), None);
    assert_eq!(perm.label(), "Task (Projects User)");
}

#[test]
fn test_non_scalar_field_detected() {
    let field: CustomField = serde_json::from_value(json!({
        "dt": "Task",
        "fieldname": "tags",
        "options": ["a", "b"],
    }))
    .unwrap();

    assert_eq!(field.non_scalar_field(), Some("options"));
    assert_eq!(custom_field().non_scalar_field(), None);
}

#[test]
fn test_upsert_outcome_display() {
    assert_eq!(UpsertOutcome::Inserted.to_string(), "inserted");
    assert_eq!(UpsertOutcome::Updated.to_string(), "updated");
}
