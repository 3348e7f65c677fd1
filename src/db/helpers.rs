//! SQL building shared by the MariaDB and SQLite backends.
//!
//! Both dialects accept backtick-quoted identifiers and `?` placeholders, so
//! one builder serves both. Identifiers are validated; values are always bound.

use serde_json::Value;
use sqlx::query::Query;

use super::{Condition, DbError, DbResult, Filter, OrderBy, Row, SortOrder};

/// Table backing a DocType: `` `tab<DocType>` ``.
pub fn table_name(doctype: &str) -> DbResult<String> {
    if doctype.trim().is_empty() || doctype.contains('`') || doctype.contains('\0') {
        return Err(DbError::InvalidData {
            message: format!("'{}' is not a valid DocType name", doctype),
            help: "DocType names must be non-empty and cannot contain backticks".to_string(),
        });
    }
    Ok(format!("`tab{}`", doctype))
}

/// Backtick-quote a column name, rejecting anything but `[A-Za-z0-9_]`.
pub fn quote_column(field: &str) -> DbResult<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DbError::InvalidData {
            message: format!("'{}' is not a valid column name", field),
            help: "Column names may only contain ASCII letters, digits and underscores"
                .to_string(),
        });
    }
    Ok(format!("`{}`", field))
}

/// WHERE clause with its positional bind values.
#[derive(Debug, Default, PartialEq)]
pub struct WhereClause {
    pub where_clause: String,
    pub bind_values: Vec<Value>,
}

/// Build a WHERE clause from a filter. An empty filter yields an empty clause.
pub fn build_where(filter: &Filter) -> DbResult<WhereClause> {
    let mut parts = Vec::with_capacity(filter.conditions.len());
    let mut bind_values = Vec::new();

    for condition in &filter.conditions {
        match condition {
            // A null or empty filter value matches "not set", like `ifnull(col, '')`.
            Condition::Eq { field, value } if is_unset(value) => {
                parts.push(format!("COALESCE({}, '') = ''", quote_column(field)?));
            }
            Condition::Eq { field, value } => {
                parts.push(format!("{} = ?", quote_column(field)?));
                bind_values.push(value.clone());
            }
            Condition::In { field, values } if values.is_empty() => {
                quote_column(field)?;
                parts.push("1 = 0".to_string());
            }
            Condition::In { field, values } => {
                let placeholders = vec!["?"; values.len()].join(", ");
                parts.push(format!("{} IN ({})", quote_column(field)?, placeholders));
                bind_values.extend(values.iter().cloned());
            }
        }
    }

    if parts.is_empty() {
        return Ok(WhereClause::default());
    }

    Ok(WhereClause {
        where_clause: format!("WHERE {}", parts.join(" AND ")),
        bind_values,
    })
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Build ORDER BY clause.
pub fn build_order_clause(order_by: Option<&OrderBy>) -> DbResult<String> {
    match order_by {
        None => Ok(String::new()),
        Some(order_by) => {
            let order = match order_by.order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            Ok(format!(
                "ORDER BY {} {}",
                quote_column(&order_by.field)?,
                order
            ))
        }
    }
}

/// Split a row into the columns the table has and those it lacks.
///
/// Unknown columns are dropped the way the framework's valid-column filter
/// drops them; `skip` names columns the caller must never write.
pub fn known_columns<'r>(
    row: &'r Row,
    columns: &[String],
    skip: &[&str],
) -> (Vec<(&'r str, &'r Value)>, Vec<&'r str>) {
    let mut known = Vec::new();
    let mut dropped = Vec::new();

    for (field, value) in row {
        if skip.contains(&field.as_str()) {
            continue;
        }
        if columns.iter().any(|c| c == field) {
            known.push((field.as_str(), value));
        } else {
            dropped.push(field.as_str());
        }
    }

    (known, dropped)
}

/// `INSERT INTO table (cols) VALUES (?, ...)` for the given columns.
pub fn build_insert(table: &str, known: &[(&str, &Value)]) -> DbResult<String> {
    let columns = known
        .iter()
        .map(|(field, _)| quote_column(field))
        .collect::<DbResult<Vec<_>>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    ))
}

/// `UPDATE table SET col = ?, ... WHERE name = ?` for the given columns.
pub fn build_update(table: &str, known: &[(&str, &Value)]) -> DbResult<String> {
    let assignments = known
        .iter()
        .map(|(field, _)| quote_column(field).map(|c| format!("{} = ?", c)))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(format!(
        "UPDATE {} SET {} WHERE `name` = ?",
        table,
        assignments.join(", ")
    ))
}

/// Refuse a row that cannot be inserted without a primary key.
pub fn require_name<'r>(doctype: &str, row: &'r Row) -> DbResult<&'r str> {
    match row.get("name") {
        Some(Value::String(name)) if !name.is_empty() => Ok(name),
        _ => Err(DbError::InvalidData {
            message: format!("{} row has no name", doctype),
            help: "Assign a name before inserting".to_string(),
        }),
    }
}

/// Bind a JSON scalar as the closest SQL type.
///
/// Booleans become 0/1 the way Check fields are stored. Nested values are
/// bound as their JSON text.
pub fn bind_value<'q, DB>(
    query: Query<'q, DB, <DB as sqlx::Database>::Arguments<'q>>,
    value: &Value,
) -> Query<'q, DB, <DB as sqlx::Database>::Arguments<'q>>
where
    DB: sqlx::Database,
    Option<String>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    String: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Decode a DECIMAL/NUMERIC rendered as text into a JSON number when it is one.
pub fn numeric_text(text: String) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(text),
    }
}
