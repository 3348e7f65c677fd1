//! Sync module - moving customizations between sites as JSON files.
//!
//! Export writes one bundle per DocType; import applies every bundle in a
//! directory back to a site. `doctype_export` writes full DocType
//! definitions into the app's module tree.

mod bundle;
mod doctype_export;
mod export;
#[cfg(test)]
mod export_test;
mod import;

pub use bundle::{BundleError, CustomizationBundle, bundle_file_name, read_bundle, write_bundle};
pub use doctype_export::{
    CHILD_TABLES, DocExportError, DocExportSummary, app_doctypes, definition_path,
    export_all_docs, export_doctype, load_definition, scrub,
};
pub use export::{
    ExportError, ExportOptions, ExportSummary, collect_bundle, export_customizations,
};
pub use import::{
    FailedFile, FileReport, ImportError, ImportOptions, ImportSummary, PermReplacement,
    RecordOutcome, bundle_files, import_customizations,
};
