//! MariaDB implementation of the metadata store, the framework's default
//! database engine.

mod connection;
mod store;


pub use connection::MariaDbStore;
