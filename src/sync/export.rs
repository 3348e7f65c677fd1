//! Export customization bundles, one file per DocType.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{error, info};

use crate::context::SiteContext;
use crate::db::{
    ClientScript, CustomDocPerm, CustomField, Customization, DbError, Filter, MetadataStore,
    OrderBy, PropertySetter, ServerScript,
};

use super::bundle::{CustomizationBundle, write_bundle};

/// Errors that can occur during export.
#[derive(Error, Diagnostic, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    #[diagnostic(code(frappe_customs::sync::export::database))]
    Database(#[from] DbError),

    #[error("Failed to create {}: {source}", path.display())]
    #[diagnostic(code(frappe_customs::sync::export::create_dir))]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable {doctype} row: {source}")]
    #[diagnostic(code(frappe_customs::sync::export::decode))]
    Decode {
        doctype: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Knobs for [`export_customizations`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Filter scripts by the DocType being exported instead of by the whole
    /// requested list. Off by default, in which case every bundle carries
    /// the scripts of every requested DocType.
    pub scope_scripts_to_doctype: bool,
}

/// Summary of an export run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub doctypes_scanned: usize,
    pub files_written: Vec<PathBuf>,
    pub skipped: Vec<String>,
    /// DocTypes whose file could not be written, with the error message.
    pub failed: Vec<(String, String)>,
    pub custom_fields: usize,
    pub property_setters: usize,
    pub client_scripts: usize,
    pub server_scripts: usize,
    pub custom_perms: usize,
}

impl ExportSummary {
    pub fn total_records(&self) -> usize {
        self.custom_fields
            + self.property_setters
            + self.client_scripts
            + self.server_scripts
            + self.custom_perms
    }

    fn record(&mut self, bundle: &CustomizationBundle) {
        self.custom_fields += bundle.custom_fields.len();
        self.property_setters += bundle.property_setters.len();
        self.client_scripts += bundle.client_scripts.len();
        self.server_scripts += bundle.server_scripts.len();
        self.custom_perms += bundle.custom_perms.len();
    }
}

/// Export the customizations of `doctypes` into `output_dir`.
///
/// With no list (or an empty one) every non-custom DocType is exported.
/// DocTypes without any customization are skipped; existing files are
/// overwritten. A storage fault aborts the run. A file that cannot be
/// written is logged and recorded in [`ExportSummary::failed`].
pub async fn export_customizations<S: MetadataStore>(
    ctx: &SiteContext<S>,
    doctypes: Option<Vec<String>>,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    fs::create_dir_all(output_dir).map_err(|source| ExportError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let doctypes = match doctypes.filter(|list| !list.is_empty()) {
        Some(list) => list,
        None => {
            ctx.store
                .get_names(
                    "DocType",
                    &Filter::new().eq("custom", 0),
                    Some(&OrderBy::default()),
                )
                .await?
        }
    };

    let mut summary = ExportSummary::default();

    for doctype in &doctypes {
        summary.doctypes_scanned += 1;

        let script_scope: &[String] = if options.scope_scripts_to_doctype {
            std::slice::from_ref(doctype)
        } else {
            &doctypes
        };
        let bundle = collect_bundle(&ctx.store, doctype, script_scope).await?;

        if bundle.is_empty() {
            summary.skipped.push(doctype.clone());
            continue;
        }

        match write_bundle(output_dir, doctype, &bundle) {
            Ok(path) => {
                summary.record(&bundle);
                summary.files_written.push(path);
                info!("Exported customizations for {}", doctype);
            }
            Err(err) => {
                error!("Failed to export customizations for {}: {}", doctype, err);
                summary.failed.push((doctype.clone(), err.to_string()));
            }
        }
    }

    info!("Customization export completed");
    Ok(summary)
}

/// Gather every category for one DocType.
pub async fn collect_bundle<S: MetadataStore>(
    store: &S,
    doctype: &str,
    script_scope: &[String],
) -> Result<CustomizationBundle, ExportError> {
    let default_order = OrderBy::default();

    Ok(CustomizationBundle {
        custom_fields: fetch::<_, CustomField>(
            store,
            &Filter::new().eq("dt", doctype),
            Some(&OrderBy::asc("idx")),
        )
        .await?,
        property_setters: fetch::<_, PropertySetter>(
            store,
            &Filter::new().eq("doc_type", doctype),
            Some(&default_order),
        )
        .await?,
        client_scripts: fetch::<_, ClientScript>(
            store,
            &Filter::new().is_in("dt", script_scope.iter().map(String::as_str)),
            Some(&default_order),
        )
        .await?,
        server_scripts: fetch::<_, ServerScript>(
            store,
            &Filter::new().is_in(
                "reference_doctype",
                script_scope.iter().map(String::as_str),
            ),
            Some(&default_order),
        )
        .await?,
        custom_perms: fetch::<_, CustomDocPerm>(
            store,
            &Filter::new().eq("parent", doctype),
            Some(&OrderBy::asc("name")),
        )
        .await?,
    })
}

async fn fetch<S: MetadataStore, R: Customization>(
    store: &S,
    filter: &Filter,
    order_by: Option<&OrderBy>,
) -> Result<Vec<R>, ExportError> {
    store
        .get_all(R::DOCTYPE, filter, order_by)
        .await?
        .into_iter()
        .map(|row| {
            R::from_row(row).map_err(|source| ExportError::Decode {
                doctype: R::DOCTYPE,
                source,
            })
        })
        .collect()
}
