//! Shared utilities for CLI commands

use std::path::Path;

use tabled::{Table, settings::Style};

/// Parse the comma-separated `--doctypes` value. Empty means "all".
pub fn parse_doctypes(doctypes: &str) -> Option<Vec<String>> {
    let list: Vec<String> = doctypes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if list.is_empty() { None } else { Some(list) }
}

/// Show a path relative to `base` when it lies underneath it.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}
