//! Metadata store trait.
//!
//! The slice of the framework's ORM this tool needs: filtered reads, name
//! lookup, bypass-validation writes, bulk delete and explicit transactions.
//! Backends implement the primitives; upsert is built on top of them.

use serde_json::Value;

use super::utils::stamp_for_insert;
use super::{DbError, DbResult, Filter, OrderBy, Row, UpsertOutcome};

/// Storage interface over a site's `tab<DocType>` tables.
#[allow(async_fn_in_trait)]
pub trait MetadataStore: Send + Sync {
    /// All columns of every row of `doctype` matching `filter`.
    async fn get_all(
        &self,
        doctype: &str,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> DbResult<Vec<Row>>;

    /// `name` of the first row matching `filter`, if any.
    async fn get_value(&self, doctype: &str, filter: &Filter) -> DbResult<Option<String>>;

    /// Column names of the table backing `doctype`.
    async fn columns(&self, doctype: &str) -> DbResult<Vec<String>>;

    /// Insert `row` as a new record.
    ///
    /// Bypasses validation, hooks and version history. Columns the table does
    /// not have are dropped. The row must carry a `name`.
    async fn raw_insert(&self, doctype: &str, row: &Row) -> DbResult<()>;

    /// Overwrite the record `name` with the columns in `row`.
    ///
    /// Bypasses validation, hooks and version history. `name` itself is never
    /// rewritten and unknown columns are dropped.
    async fn raw_update(&self, doctype: &str, name: &str, row: &Row) -> DbResult<()>;

    /// Delete every row matching `filter`. Returns the number removed.
    ///
    /// An empty filter is refused rather than truncating the table.
    async fn delete_where(&self, doctype: &str, filter: &Filter) -> DbResult<u64>;

    async fn begin(&self) -> DbResult<()>;

    async fn commit(&self) -> DbResult<()>;

    async fn rollback(&self) -> DbResult<()>;

    /// Fetch one record by name.
    async fn get_doc(&self, doctype: &str, name: &str) -> DbResult<Row> {
        let filter = Filter::new().eq("name", name);
        self.get_all(doctype, &filter, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                doctype: doctype.to_string(),
                name: name.to_string(),
            })
    }

    /// `name` column of every row matching `filter`.
    async fn get_names(
        &self,
        doctype: &str,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> DbResult<Vec<String>> {
        let rows = self.get_all(doctype, filter, order_by).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.get("name") {
                Some(Value::String(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }

    /// Update-if-exists-else-insert, matched by `identity`.
    ///
    /// This is a raw write: it skips every referential and business-rule check
    /// the framework's save pipeline would run, and records no version
    /// history. With no identity the row is always inserted. Inserts are
    /// stamped with `user` as `modified_by` (and `owner` when absent).
    async fn raw_upsert(
        &self,
        doctype: &str,
        identity: Option<&Filter>,
        mut row: Row,
        user: &str,
    ) -> DbResult<UpsertOutcome> {
        let existing = match identity {
            Some(filter) => self.get_value(doctype, filter).await?,
            None => None,
        };

        match existing {
            Some(name) => {
                self.raw_update(doctype, &name, &row).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                stamp_for_insert(&mut row, user);
                self.raw_insert(doctype, &row).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}
