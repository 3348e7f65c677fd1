//! Backend chosen at runtime from the site's `db_type`.

use super::{DbResult, Filter, MariaDbStore, MetadataStore, OrderBy, Row, SqliteStore};

/// A site's store, whichever engine the site runs on.
pub enum SiteStore {
    MariaDb(MariaDbStore),
    Sqlite(SqliteStore),
}

impl SiteStore {
    /// Connect from a URL; `sqlite:` URLs select SQLite, anything else MariaDB.
    pub async fn connect(url: &str) -> DbResult<Self> {
        if url.starts_with("sqlite:") {
            Ok(SiteStore::Sqlite(SqliteStore::connect(url).await?))
        } else {
            Ok(SiteStore::MariaDb(MariaDbStore::connect(url).await?))
        }
    }

    pub fn engine(&self) -> &'static str {
        match self {
            SiteStore::MariaDb(_) => "mariadb",
            SiteStore::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            SiteStore::MariaDb($store) => $call,
            SiteStore::Sqlite($store) => $call,
        }
    };
}

impl MetadataStore for SiteStore {
    async fn get_all(
        &self,
        doctype: &str,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> DbResult<Vec<Row>> {
        dispatch!(self, s => s.get_all(doctype, filter, order_by).await)
    }

    async fn get_value(&self, doctype: &str, filter: &Filter) -> DbResult<Option<String>> {
        dispatch!(self, s => s.get_value(doctype, filter).await)
    }

    async fn columns(&self, doctype: &str) -> DbResult<Vec<String>> {
        dispatch!(self, s => s.columns(doctype).await)
    }

    async fn raw_insert(&self, doctype: &str, row: &Row) -> DbResult<()> {
        dispatch!(self, s => s.raw_insert(doctype, row).await)
    }

    async fn raw_update(&self, doctype: &str, name: &str, row: &Row) -> DbResult<()> {
        dispatch!(self, s => s.raw_update(doctype, name, row).await)
    }

    async fn delete_where(&self, doctype: &str, filter: &Filter) -> DbResult<u64> {
        dispatch!(self, s => s.delete_where(doctype, filter).await)
    }

    async fn begin(&self) -> DbResult<()> {
        dispatch!(self, s => s.begin().await)
    }

    async fn commit(&self) -> DbResult<()> {
        dispatch!(self, s => s.commit().await)
    }

    async fn rollback(&self) -> DbResult<()> {
        dispatch!(self, s => s.rollback().await)
    }
}
