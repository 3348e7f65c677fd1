//! Domain models for the metadata store.
//!
//! Rows are dynamic (`Row`), but each customization category gets an explicit
//! type naming the columns the tool reasons about. Every other column rides
//! along in a flattened `extra` map so unknown fields pass through untouched.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::utils::generate_hash;

/// One row of a `tab<DocType>` table, keyed by column name.
pub type Row = Map<String, Value>;

// =============================================================================
// Query Types
// =============================================================================

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// ORDER BY column and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl Default for OrderBy {
    /// The framework's list default: most recently modified first.
    fn default() -> Self {
        Self::desc("modified")
    }
}

/// A single predicate on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field = value`. A null value matches NULL and empty strings.
    Eq { field: String, value: Value },
    /// `field IN (values)`. An empty list matches nothing.
    In { field: String, values: Vec<Value> },
}

/// Conjunction of conditions, built fluently.
///
/// ```ignore
/// let filter = Filter::new().eq("dt", "Task").eq("fieldname", "due_priority");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// What a raw upsert ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "inserted"),
            UpsertOutcome::Updated => write!(f, "updated"),
        }
    }
}

// =============================================================================
// Customization Records
// =============================================================================

/// A record of one customization category, stored in `tab{DOCTYPE}`.
pub trait Customization: Serialize + DeserializeOwned {
    /// DocType whose table holds records of this category.
    const DOCTYPE: &'static str;

    /// Primary key, when the record carries one.
    fn name(&self) -> Option<&str>;

    fn set_name(&mut self, name: String);

    /// Filter locating the stored counterpart of this record.
    ///
    /// `None` means the record has no identity and can only be inserted.
    fn identity(&self) -> Option<Filter>;

    /// Name the framework would assign on insert.
    fn autoname(&self) -> String {
        generate_hash()
    }

    /// Human readable label for progress output.
    fn label(&self) -> String;

    /// Columns not modelled as named fields.
    fn extra(&self) -> &Row;

    /// First non-scalar column in `extra`, if any.
    ///
    /// Records mirror flat table rows, so nested arrays or objects cannot be
    /// written back.
    fn non_scalar_field(&self) -> Option<&str> {
        self.extra()
            .iter()
            .find(|(_, v)| v.is_array() || v.is_object())
            .map(|(k, _)| k.as_str())
    }

    fn to_row(&self) -> serde_json::Result<Row> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            other => Err(serde::ser::Error::custom(format!(
                "{} record serialized to {}, expected an object",
                Self::DOCTYPE,
                other
            ))),
        }
    }

    fn from_row(row: Row) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(row))
    }
}

/// `Custom Field`: an extra field added to a DocType.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning DocType.
    pub dt: String,
    pub fieldname: String,
    #[serde(flatten)]
    pub extra: Row,
}

impl Customization for CustomField {
    const DOCTYPE: &'static str = "Custom Field";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn identity(&self) -> Option<Filter> {
        Some(
            Filter::new()
                .eq("dt", self.dt.as_str())
                .eq("fieldname", self.fieldname.as_str()),
        )
    }

    fn autoname(&self) -> String {
        format!("{}-{}", self.dt, self.fieldname)
    }

    fn label(&self) -> String {
        format!("{}.{}", self.dt, self.fieldname)
    }

    fn extra(&self) -> &Row {
        &self.extra
    }
}

/// `Property Setter`: an override of one schema property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning DocType.
    pub doc_type: String,
    /// Null for DocType-level properties.
    #[serde(default)]
    pub field_name: Option<String>,
    pub property: String,
    #[serde(flatten)]
    pub extra: Row,
}

impl Customization for PropertySetter {
    const DOCTYPE: &'static str = "Property Setter";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn identity(&self) -> Option<Filter> {
        Some(
            Filter::new()
                .eq("doc_type", self.doc_type.as_str())
                .eq("field_name", self.field_name.clone())
                .eq("property", self.property.as_str()),
        )
    }

    fn autoname(&self) -> String {
        [
            Some(self.doc_type.as_str()),
            self.field_name.as_deref(),
            Some(self.property.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
    }

    fn label(&self) -> String {
        format!(
            "{}.{}",
            self.doc_type,
            self.field_name.as_deref().unwrap_or("")
        )
    }

    fn extra(&self) -> &Row {
        &self.extra
    }
}

/// `Client Script`: browser-side script bound to a DocType.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

/// `Server Script`: server-side script, optionally bound to a DocType.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

// Scripts are keyed by name only; a nameless script never matches.
macro_rules! named_customization {
    ($ty:ty, $doctype:literal) => {
        impl Customization for $ty {
            const DOCTYPE: &'static str = $doctype;

            fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            fn set_name(&mut self, name: String) {
                self.name = Some(name);
            }

            fn identity(&self) -> Option<Filter> {
                self.name.as_deref().map(|n| Filter::new().eq("name", n))
            }

            fn label(&self) -> String {
                self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
            }

            fn extra(&self) -> &Row {
                &self.extra
            }
        }
    };
}

named_customization!(ClientScript, "Client Script");
named_customization!(ServerScript, "Server Script");

/// `Custom DocPerm`: a permission rule overriding the DocType's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDocPerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// DocType the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

impl Customization for CustomDocPerm {
    const DOCTYPE: &'static str = "Custom DocPerm";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn identity(&self) -> Option<Filter> {
        None
    }

    fn label(&self) -> String {
        let role = self
            .extra
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("?");
        format!("{} ({})", self.parent.as_deref().unwrap_or("?"), role)
    }

    fn extra(&self) -> &Row {
        &self.extra
    }
}
