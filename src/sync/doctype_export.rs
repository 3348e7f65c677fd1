//! Export full DocType definitions into the app's module tree.
//!
//! Each DocType lands at
//! `<app_path>/<module>/doctype/<name>/<name>.json` (names scrubbed), written
//! in the framework's own format: sorted keys, one-space indent, no nulls.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::SiteContext;
use crate::db::{
    DbError, Filter, MetadataStore, OrderBy, Row, generate_hash, stamp_for_insert,
};

/// Child tables of a DocType, keyed by the parent field that holds them.
pub const CHILD_TABLES: &[(&str, &str)] = &[
    ("fields", "DocField"),
    ("permissions", "DocPerm"),
    ("actions", "DocType Action"),
    ("links", "DocType Link"),
    ("states", "DocType State"),
];

/// Columns stripped from child rows on export.
const CHILD_DEFAULT_FIELDS: &[&str] = &[
    "doctype",
    "name",
    "owner",
    "creation",
    "modified",
    "modified_by",
    "docstatus",
    "idx",
    "parent",
    "parentfield",
    "parenttype",
];

/// Failure exporting a single DocType.
#[derive(Error, Diagnostic, Debug)]
pub enum DocExportError {
    #[error("Database error: {0}")]
    #[diagnostic(code(frappe_customs::sync::doctype_export::database))]
    Database(#[from] DbError),

    #[error("DocType {doctype} has no module")]
    #[diagnostic(code(frappe_customs::sync::doctype_export::missing_module))]
    MissingModule { doctype: String },

    #[error("Failed to write {}: {source}", path.display())]
    #[diagnostic(code(frappe_customs::sync::doctype_export::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {doctype}: {source}")]
    #[diagnostic(code(frappe_customs::sync::doctype_export::serialize))]
    Serialize {
        doctype: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of [`export_all_docs`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DocExportSummary {
    pub exported: Vec<(String, PathBuf)>,
    /// DocType and the error message recorded for it.
    pub failed: Vec<(String, String)>,
}

impl DocExportSummary {
    pub fn total(&self) -> usize {
        self.exported.len() + self.failed.len()
    }
}

/// Lowercase and replace spaces and hyphens with underscores.
pub fn scrub(name: &str) -> String {
    name.replace([' ', '-'], "_").to_lowercase()
}

/// Where a DocType's definition lives inside the app package.
pub fn definition_path(app_path: &Path, module: &str, doctype: &str) -> PathBuf {
    let scrubbed = scrub(doctype);
    app_path
        .join(scrub(module))
        .join("doctype")
        .join(&scrubbed)
        .join(format!("{}.json", scrubbed))
}

/// Names of every DocType whose module belongs to `app_name`.
pub async fn app_doctypes<S: MetadataStore>(
    store: &S,
    app_name: &str,
) -> Result<Vec<String>, DbError> {
    let modules = store
        .get_names(
            "Module Def",
            &Filter::new().eq("app_name", app_name),
            Some(&OrderBy::asc("name")),
        )
        .await?;
    if modules.is_empty() {
        return Ok(Vec::new());
    }

    store
        .get_names(
            "DocType",
            &Filter::new().is_in("module", modules),
            Some(&OrderBy::asc("name")),
        )
        .await
}

/// Export every DocType of the context's app.
///
/// A DocType that fails is logged, written to `Error Log` and skipped; only a
/// failure listing the DocTypes aborts the run.
pub async fn export_all_docs<S: MetadataStore>(
    ctx: &SiteContext<S>,
) -> Result<DocExportSummary, DbError> {
    let doctypes = app_doctypes(&ctx.store, &ctx.app.name).await?;
    let mut summary = DocExportSummary::default();

    if doctypes.is_empty() {
        warn!("No doctypes found for app {}", ctx.app.name);
        return Ok(summary);
    }

    for doctype in doctypes {
        match export_doctype(&ctx.store, &ctx.app.path, &doctype).await {
            Ok(path) => {
                info!("Exported {}", doctype);
                summary.exported.push((doctype, path));
            }
            Err(err) => {
                error!("Failed {}: {}", doctype, err);
                log_export_failure(ctx, &doctype, &err.to_string()).await;
                summary.failed.push((doctype, err.to_string()));
            }
        }
    }

    info!(
        "Exported {} of {} doctypes",
        summary.exported.len(),
        summary.total()
    );
    Ok(summary)
}

/// Load and write one DocType definition, returning the file written.
pub async fn export_doctype<S: MetadataStore>(
    store: &S,
    app_path: &Path,
    doctype: &str,
) -> Result<PathBuf, DocExportError> {
    let doc = load_definition(store, doctype).await?;
    let module = match doc.get("module") {
        Some(Value::String(module)) if !module.is_empty() => module.clone(),
        _ => {
            return Err(DocExportError::MissingModule {
                doctype: doctype.to_string(),
            });
        }
    };

    let path = definition_path(app_path, &module, doctype);
    let json = to_framework_json(&doc).map_err(|source| DocExportError::Serialize {
        doctype: doctype.to_string(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DocExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, json).map_err(|source| DocExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// The DocType row with its child tables attached, nulls removed.
pub async fn load_definition<S: MetadataStore>(store: &S, doctype: &str) -> Result<Row, DbError> {
    let mut doc = strip_nulls(store.get_doc("DocType", doctype).await?);
    doc.insert("doctype".to_string(), Value::from("DocType"));

    for (parentfield, child_doctype) in CHILD_TABLES {
        let filter = Filter::new()
            .eq("parent", doctype)
            .eq("parentfield", *parentfield);
        let children = store
            .get_all(child_doctype, &filter, Some(&OrderBy::asc("idx")))
            .await?
            .into_iter()
            .map(|row| {
                let mut row = strip_nulls(row);
                for field in CHILD_DEFAULT_FIELDS {
                    row.remove(*field);
                }
                Value::Object(row)
            })
            .collect();
        doc.insert(parentfield.to_string(), Value::Array(children));
    }

    Ok(doc)
}

fn strip_nulls(row: Row) -> Row {
    row.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Sorted keys, one-space indent, no trailing newline.
fn to_framework_json(doc: &Row) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    doc.serialize(&mut serializer)?;
    Ok(out)
}

async fn log_export_failure<S: MetadataStore>(ctx: &SiteContext<S>, doctype: &str, message: &str) {
    let mut row = Row::new();
    row.insert("name".to_string(), Value::from(generate_hash()));
    row.insert("seen".to_string(), Value::from(0));
    row.insert("reference_doctype".to_string(), Value::from("DocType"));
    row.insert("reference_name".to_string(), Value::from(doctype));
    row.insert(
        "method".to_string(),
        Value::from(format!("Export failed for {}", doctype)),
    );
    row.insert("error".to_string(), Value::from(message));
    stamp_for_insert(&mut row, &ctx.user);

    if let Err(err) = ctx.store.raw_insert("Error Log", &row).await {
        warn!("Could not record export failure for {}: {}", doctype, err);
    }
}
