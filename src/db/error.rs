//! Database error types.
//!
//! Storage-backend agnostic errors for the metadata store. Both the MariaDB
//! and the SQLite backend map their driver errors into these variants.

use miette::Diagnostic;
use thiserror::Error;

/// Metadata store errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("{doctype} '{name}' not found")]
    #[diagnostic(code(frappe_customs::db::not_found))]
    NotFound { doctype: String, name: String },

    #[error("Invalid data: {message}")]
    #[diagnostic(code(frappe_customs::db::invalid_data))]
    InvalidData {
        message: String,
        #[help]
        help: String,
    },

    #[error("Query failed on {doctype}: {message}")]
    #[diagnostic(code(frappe_customs::db::query))]
    Query { doctype: String, message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(
        code(frappe_customs::db::connection),
        help("Check the site's db_host/db_port/db_name or pass --database-url.")
    )]
    Connection { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(frappe_customs::db::migration))]
    Migration { message: String },

    #[error("Transaction error: {message}")]
    #[diagnostic(code(frappe_customs::db::transaction))]
    Transaction { message: String },
}

impl DbError {
    pub(crate) fn query(doctype: &str, e: impl std::fmt::Display) -> Self {
        DbError::Query {
            doctype: doctype.to_string(),
            message: e.to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
