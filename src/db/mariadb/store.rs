//! MariaDB `MetadataStore` implementation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use super::MariaDbStore;
use crate::db::helpers::{
    bind_value, build_insert, build_order_clause, build_update, build_where, known_columns,
    numeric_text, require_name, table_name,
};
use crate::db::utils::format_datetime;
use crate::db::{DbError, DbResult, Filter, MetadataStore, OrderBy, Row};

impl MetadataStore for MariaDbStore {
    async fn get_all(
        &self,
        doctype: &str,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> DbResult<Vec<Row>> {
        let where_clause = build_where(filter)?;
        let sql = format!(
            "SELECT * FROM {} {} {}",
            table_name(doctype)?,
            where_clause.where_clause,
            build_order_clause(order_by)?
        );

        let mut query = sqlx::query(&sql);
        for value in &where_clause.bind_values {
            query = bind_value(query, value);
        }

        let mut conn = self.conn.lock().await;
        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| DbError::query(doctype, e))?;

        rows.iter().map(|row| decode_row(doctype, row)).collect()
    }

    async fn get_value(&self, doctype: &str, filter: &Filter) -> DbResult<Option<String>> {
        let where_clause = build_where(filter)?;
        let sql = format!(
            "SELECT `name` FROM {} {} LIMIT 1",
            table_name(doctype)?,
            where_clause.where_clause
        );

        let mut query = sqlx::query(&sql);
        for value in &where_clause.bind_values {
            query = bind_value(query, value);
        }

        let mut conn = self.conn.lock().await;
        let row = query
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DbError::query(doctype, e))?;

        row.map(|row| row.try_get_unchecked::<String, _>(0))
            .transpose()
            .map_err(|e| DbError::query(doctype, e))
    }

    async fn columns(&self, doctype: &str) -> DbResult<Vec<String>> {
        table_name(doctype)?;

        let mut conn = self.conn.lock().await;
        let rows = sqlx::query(
            "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(format!("tab{}", doctype))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| DbError::query(doctype, e))?;

        // information_schema reports names as binary strings on some servers.
        let columns = rows
            .iter()
            .map(|row| row.try_get_unchecked::<String, _>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::query(doctype, e))?;

        if columns.is_empty() {
            return Err(DbError::query(doctype, "table does not exist"));
        }
        Ok(columns)
    }

    async fn raw_insert(&self, doctype: &str, row: &Row) -> DbResult<()> {
        require_name(doctype, row)?;
        let columns = self.columns(doctype).await?;
        let (known, dropped) = known_columns(row, &columns, &[]);
        if !dropped.is_empty() {
            debug!(doctype, ?dropped, "Dropping columns the table does not have");
        }

        let sql = build_insert(&table_name(doctype)?, &known)?;
        let mut query = sqlx::query(&sql);
        for (_, value) in &known {
            query = bind_value(query, value);
        }

        let mut conn = self.conn.lock().await;
        query
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::query(doctype, e))?;
        Ok(())
    }

    async fn raw_update(&self, doctype: &str, name: &str, row: &Row) -> DbResult<()> {
        let columns = self.columns(doctype).await?;
        let (known, dropped) = known_columns(row, &columns, &["name"]);
        if !dropped.is_empty() {
            debug!(doctype, ?dropped, "Dropping columns the table does not have");
        }
        if known.is_empty() {
            return Ok(());
        }

        let sql = build_update(&table_name(doctype)?, &known)?;
        let mut query = sqlx::query(&sql);
        for (_, value) in &known {
            query = bind_value(query, value);
        }
        query = query.bind(name.to_string());

        let mut conn = self.conn.lock().await;
        query
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::query(doctype, e))?;
        Ok(())
    }

    async fn delete_where(&self, doctype: &str, filter: &Filter) -> DbResult<u64> {
        if filter.is_empty() {
            return Err(DbError::InvalidData {
                message: format!("refusing to delete every {} row", doctype),
                help: "Pass a filter to delete_where".to_string(),
            });
        }

        let where_clause = build_where(filter)?;
        let sql = format!(
            "DELETE FROM {} {}",
            table_name(doctype)?,
            where_clause.where_clause
        );
        let mut query = sqlx::query(&sql);
        for value in &where_clause.bind_values {
            query = bind_value(query, value);
        }

        let mut conn = self.conn.lock().await;
        let result = query
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::query(doctype, e))?;
        Ok(result.rows_affected())
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_statement("START TRANSACTION").await
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_statement("COMMIT").await
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_statement("ROLLBACK").await
    }
}

impl MariaDbStore {
    // Transaction control is not preparable on MariaDB; send it as plain text.
    async fn transaction_statement(&self, statement: &'static str) -> DbResult<()> {
        let mut conn = self.conn.lock().await;
        sqlx::raw_sql(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Transaction {
                message: format!("{} failed: {}", statement, e),
            })?;
        Ok(())
    }
}

/// Decode a row by declared column type, coercing dates to strings.
fn decode_row(doctype: &str, row: &MySqlRow) -> DbResult<Row> {
    let mut out = Row::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(|e| DbError::query(doctype, e))?;
        if raw.is_null() {
            out.insert(column.name().to_string(), Value::Null);
            continue;
        }

        let type_name = column.type_info().name();
        let value = match type_name {
            "FLOAT" => Value::from(f64::from(
                row.try_get_unchecked::<f32, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?,
            )),
            "DOUBLE" => Value::from(
                row.try_get_unchecked::<f64, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?,
            ),
            "DECIMAL" => numeric_text(
                row.try_get_unchecked::<String, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?,
            ),
            "DATETIME" | "TIMESTAMP" => {
                let dt = row
                    .try_get_unchecked::<NaiveDateTime, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?;
                Value::String(format_datetime(&dt))
            }
            "DATE" => {
                let date = row
                    .try_get_unchecked::<NaiveDate, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?;
                Value::String(date.format("%Y-%m-%d").to_string())
            }
            "TIME" => {
                let time = row
                    .try_get_unchecked::<NaiveTime, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?;
                let rendered = if time.nanosecond() == 0 {
                    time.format("%H:%M:%S")
                } else {
                    time.format("%H:%M:%S%.6f")
                };
                Value::String(rendered.to_string())
            }
            t if t.contains("BLOB") || t.contains("BINARY") => {
                let bytes = row
                    .try_get_unchecked::<Vec<u8>, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            t if t.contains("INT") || t == "BOOLEAN" || t == "YEAR" => Value::from(
                row.try_get_unchecked::<i64, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?,
            ),
            _ => Value::String(
                row.try_get_unchecked::<String, _>(idx)
                    .map_err(|e| DbError::query(doctype, e))?,
            ),
        };

        out.insert(column.name().to_string(), value);
    }

    Ok(out)
}
