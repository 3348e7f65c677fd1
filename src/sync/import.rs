//! Import customization bundles into a site.
//!
//! Every `.json` file in the directory is applied in file-name order, each
//! inside its own transaction. Custom fields, property setters and scripts
//! are upserted by identity; custom permissions replace whatever the DocType
//! had before.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::SiteContext;
use crate::db::{
    CustomDocPerm, Customization, DbError, Filter, MetadataStore, Row, UpsertOutcome,
    stamp_for_insert,
};

use super::bundle::{BundleError, read_bundle};

/// Errors that can occur during import.
#[derive(Error, Diagnostic, Debug)]
pub enum ImportError {
    #[error("Database error: {0}")]
    #[diagnostic(code(frappe_customs::sync::import::database))]
    Database(#[from] DbError),

    #[error("Bundle error: {0}")]
    #[diagnostic(code(frappe_customs::sync::import::bundle))]
    Bundle(#[from] BundleError),

    #[error("Failed to list {}: {source}", path.display())]
    #[diagnostic(code(frappe_customs::sync::import::read_dir))]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("custom_perms in {file} has no parent")]
    #[diagnostic(
        code(frappe_customs::sync::import::missing_parent),
        help("The first permission record names the DocType whose permissions are replaced")
    )]
    MissingParent { file: String },

    #[error("{doctype} without a name in {file}")]
    #[diagnostic(
        code(frappe_customs::sync::import::unnamed_script),
        help("Scripts are matched by name; drop --require-script-names to insert them as new records")
    )]
    UnnamedScript { doctype: &'static str, file: String },

    #[error("Failed to convert {doctype} record: {source}")]
    #[diagnostic(code(frappe_customs::sync::import::record))]
    Record {
        doctype: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Knobs for [`import_customizations`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Roll back a failing file and continue with the next one.
    pub keep_going: bool,
    /// Refuse script records without a name instead of inserting them.
    pub require_script_names: bool,
}

/// One record written during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub doctype: &'static str,
    pub label: String,
    pub outcome: UpsertOutcome,
}

/// Custom permissions replaced for a DocType.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermReplacement {
    pub parent: String,
    pub removed: u64,
    pub inserted: usize,
}

/// What happened to one bundle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub records: Vec<RecordOutcome>,
    pub perms: Option<PermReplacement>,
}

impl FileReport {
    pub fn count(&self, outcome: UpsertOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// A file rolled back under `keep_going`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Summary of an import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: Vec<FileReport>,
    pub failed: Vec<FailedFile>,
}

impl ImportSummary {
    pub fn inserted(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.count(UpsertOutcome::Inserted))
            .sum()
    }

    pub fn updated(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.count(UpsertOutcome::Updated))
            .sum()
    }
}

/// Import every bundle in `input_dir`.
///
/// By default the first failing file aborts the run; files before it stay
/// committed and files after it are not touched. With `keep_going` the
/// failure is rolled back, recorded and the next file is processed.
pub async fn import_customizations<S: MetadataStore>(
    ctx: &SiteContext<S>,
    input_dir: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError> {
    let files = bundle_files(input_dir)?;
    let mut summary = ImportSummary::default();

    for path in &files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match import_file(ctx, path, &file, options).await {
            Ok(report) => {
                info!("==> Imported customizations from {}", file);
                summary.files.push(report);
            }
            Err(err) if options.keep_going => {
                error!("Skipping {}: {}", file, err);
                summary.failed.push(FailedFile {
                    file,
                    error: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    info!("Customization import completed ({} files)", files.len());
    Ok(summary)
}

/// `.json` files directly inside `dir`, sorted by file name.
pub fn bundle_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let read_dir_error = |source| ImportError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        let is_json = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(".json"));
        if is_json && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Apply one bundle file inside a transaction.
async fn import_file<S: MetadataStore>(
    ctx: &SiteContext<S>,
    path: &Path,
    file: &str,
    options: &ImportOptions,
) -> Result<FileReport, ImportError> {
    let bundle = read_bundle(path)?;

    ctx.store.begin().await?;
    let result = async move {
        let mut records = Vec::new();
        records.extend(apply_records(ctx, bundle.custom_fields, file, options).await?);
        records.extend(apply_records(ctx, bundle.property_setters, file, options).await?);
        records.extend(apply_records(ctx, bundle.client_scripts, file, options).await?);
        records.extend(apply_records(ctx, bundle.server_scripts, file, options).await?);
        let perms = replace_perms(ctx, bundle.custom_perms, file).await?;
        Ok::<_, ImportError>(FileReport {
            file: file.to_string(),
            records,
            perms,
        })
    }
    .await;

    match result {
        Ok(report) => {
            ctx.store.commit().await?;
            Ok(report)
        }
        Err(err) => {
            if let Err(rollback_err) = ctx.store.rollback().await {
                warn!("Rollback of {} failed: {}", file, rollback_err);
            }
            Err(err)
        }
    }
}

/// Upsert each record by its category's identity.
async fn apply_records<S: MetadataStore, R: Customization>(
    ctx: &SiteContext<S>,
    records: Vec<R>,
    file: &str,
    options: &ImportOptions,
) -> Result<Vec<RecordOutcome>, ImportError> {
    let mut outcomes = Vec::with_capacity(records.len());

    for mut record in records {
        let identity = record.identity();
        if identity.is_none() {
            if options.require_script_names {
                return Err(ImportError::UnnamedScript {
                    doctype: R::DOCTYPE,
                    file: file.to_string(),
                });
            }
            warn!(
                "{} without a name in {}; inserting a new record",
                R::DOCTYPE,
                file
            );
        }

        let label = record.label();
        if record.name().is_none() {
            record.set_name(record.autoname());
        }
        let row = to_row(&record)?;

        let outcome = ctx
            .store
            .raw_upsert(R::DOCTYPE, identity.as_ref(), row, &ctx.user)
            .await?;
        info!("- {} {} {}", R::DOCTYPE, label, outcome);

        outcomes.push(RecordOutcome {
            doctype: R::DOCTYPE,
            label,
            outcome,
        });
    }

    Ok(outcomes)
}

/// Delete the DocType's custom permissions and insert the bundle's instead.
async fn replace_perms<S: MetadataStore>(
    ctx: &SiteContext<S>,
    perms: Vec<CustomDocPerm>,
    file: &str,
) -> Result<Option<PermReplacement>, ImportError> {
    let Some(first) = perms.first() else {
        return Ok(None);
    };
    let parent = match first.parent.as_deref() {
        Some(parent) if !parent.is_empty() => parent.to_string(),
        _ => {
            return Err(ImportError::MissingParent {
                file: file.to_string(),
            });
        }
    };

    let removed = ctx
        .store
        .delete_where(
            CustomDocPerm::DOCTYPE,
            &Filter::new().eq("parent", parent.as_str()),
        )
        .await?;

    let inserted = perms.len();
    for mut perm in perms {
        if perm.name().is_none() {
            perm.set_name(perm.autoname());
        }
        let mut row = to_row(&perm)?;
        // Exported rows keep their timestamps; only fresh rows are stamped.
        if !has_creation(&row) {
            stamp_for_insert(&mut row, &ctx.user);
        }
        ctx.store.raw_insert(CustomDocPerm::DOCTYPE, &row).await?;
    }

    info!("- Custom DocPerm overridden for {}", parent);
    Ok(Some(PermReplacement {
        parent,
        removed,
        inserted,
    }))
}

fn to_row<R: Customization>(record: &R) -> Result<Row, ImportError> {
    record.to_row().map_err(|source| ImportError::Record {
        doctype: R::DOCTYPE,
        source,
    })
}

fn has_creation(row: &Row) -> bool {
    matches!(row.get("creation"), Some(Value::String(s)) if !s.is_empty())
}
