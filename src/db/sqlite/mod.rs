//! SQLite implementation of the metadata store.
//!
//! Used for single-file Frappe sites, scratch sites and the test suite.

mod connection;
mod store;


pub use connection::SqliteStore;
