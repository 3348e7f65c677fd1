//! Metadata store abstraction.
//!
//! Frappe keeps every DocType's records in a `tab<DocType>` table. This module
//! exposes the few operations the exporter and importer need behind the
//! `MetadataStore` trait, so MariaDB and SQLite sites are handled the same way.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Rows, filters and the typed customization records
//! - `repository`: The `MetadataStore` trait and its raw upsert
//! - `mariadb` / `sqlite`: Backends
//! - `site_store`: Runtime choice between the two

mod error;
mod helpers;
pub mod mariadb;
mod models;
mod repository;
mod site_store;
pub mod sqlite;
mod utils;

#[cfg(test)]
mod models_test;
#[cfg(test)]
mod repository_test;

pub use error::{DbError, DbResult};
pub use mariadb::MariaDbStore;
pub use models::*;
pub use repository::*;
pub use site_store::SiteStore;
pub use sqlite::SqliteStore;
pub use utils::{current_timestamp, format_datetime, generate_hash, stamp_for_insert};
