//! SQLite connection and schema bootstrap.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use tokio::sync::Mutex;

use crate::db::{DbError, DbResult};

/// SQLite-backed metadata store.
///
/// Holds exactly one connection; every operation takes the lock for its
/// duration, so calls never interleave.
pub struct SqliteStore {
    pub(crate) conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    /// Open an existing database file.
    pub async fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        Self::with_options(options).await
    }

    /// Connect using a `sqlite:` URL, e.g. `sqlite://site.db?mode=rwc`.
    pub async fn connect(url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(url).map_err(|e| DbError::Connection {
            message: e.to_string(),
        })?;
        Self::with_options(options).await
    }

    /// Create an in-memory database (useful for testing).
    pub async fn in_memory() -> DbResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn with_options(options: SqliteConnectOptions) -> DbResult<Self> {
        let conn = options.connect().await.map_err(|e| DbError::Connection {
            message: e.to_string(),
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the metadata tables this tool reads and writes.
    ///
    /// A real site's schema belongs to `bench migrate`; this is for scratch
    /// databases and tests.
    pub async fn migrate(&self) -> DbResult<()> {
        let mut conn = self.conn.lock().await;
        sqlx::migrate!("data/sql/sqlite")
            .run(&mut *conn)
            .await
            .map_err(|e| DbError::Migration {
                message: e.to_string(),
            })
    }
}
