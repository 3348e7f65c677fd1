use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::sync::{ExportError, ImportError};

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("No app given")]
    #[diagnostic(
        code(frappe_customs::cli::missing_app),
        help("Pass --app <name> or set FRAPPE_APP to the app whose files should be written.")
    )]
    MissingApp,

    #[error("Configuration error: {0}")]
    #[diagnostic(code(frappe_customs::cli::config))]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    #[diagnostic(code(frappe_customs::cli::database))]
    Database(#[from] DbError),

    #[error("Export failed: {0}")]
    #[diagnostic(code(frappe_customs::cli::export))]
    Export(#[from] ExportError),

    #[error("Import failed: {0}")]
    #[diagnostic(code(frappe_customs::cli::import))]
    Import(#[from] ImportError),
}

pub type CliResult<T> = Result<T, CliError>;
