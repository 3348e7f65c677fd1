//! Database utility functions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime, Timelike};
use serde_json::Value;

use super::models::Row;

static HASH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a 10-character hex name, the framework's `hash` autoname.
pub fn generate_hash() -> String {
    use sha2::{Digest, Sha256};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = HASH_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(duration.as_nanos().to_le_bytes());
    hasher.update(counter.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher
        .finalize()
        .iter()
        .take(5)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Current datetime in the framework's storage format.
pub fn current_timestamp() -> String {
    format_datetime(&Local::now().naive_local())
}

/// Render a datetime the way Python's `str(datetime)` does: microseconds only
/// when non-zero.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Fill the standard columns an insert would set.
///
/// `modified` and `modified_by` always reflect this write; `creation` and
/// `owner` are kept when the row already carries them.
pub fn stamp_for_insert(row: &mut Row, user: &str) {
    let now = current_timestamp();

    if is_blank(row.get("creation")) {
        row.insert("creation".to_string(), Value::String(now.clone()));
    }
    if is_blank(row.get("owner")) {
        row.insert("owner".to_string(), Value::String(user.to_string()));
    }
    row.insert("modified".to_string(), Value::String(now));
    row.insert("modified_by".to_string(), Value::String(user.to_string()));
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
