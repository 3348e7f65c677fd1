//! Customization export and import commands.

use std::path::Path;

use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, display_path, parse_doctypes};
use crate::context::SiteContext;
use crate::db::{MetadataStore, UpsertOutcome};
use crate::sync::{
    ExportOptions, ExportSummary, ImportOptions, ImportSummary, export_customizations,
    import_customizations,
};

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Records")]
    records: usize,
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Inserted")]
    inserted: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Permissions")]
    perms: String,
}

/// Export customizations for `doctypes` (comma-separated, empty for all).
pub async fn export<S: MetadataStore>(
    ctx: &SiteContext<S>,
    doctypes: &str,
    path: Option<&Path>,
    scope_scripts: bool,
) -> CliResult<String> {
    let dir = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.app.customizations_dir());
    let options = ExportOptions {
        scope_scripts_to_doctype: scope_scripts,
    };

    let summary = export_customizations(ctx, parse_doctypes(doctypes), &dir, &options).await?;
    Ok(format_export_summary(&summary, &dir))
}

pub fn format_export_summary(summary: &ExportSummary, dir: &Path) -> String {
    let mut output = format!(
        "✓ Exported {} file(s) to {}\n\n",
        summary.files_written.len(),
        dir.display()
    );

    let rows = vec![
        CategoryRow {
            category: "Custom Fields",
            records: summary.custom_fields,
        },
        CategoryRow {
            category: "Property Setters",
            records: summary.property_setters,
        },
        CategoryRow {
            category: "Client Scripts",
            records: summary.client_scripts,
        },
        CategoryRow {
            category: "Server Scripts",
            records: summary.server_scripts,
        },
        CategoryRow {
            category: "Custom DocPerms",
            records: summary.custom_perms,
        },
        CategoryRow {
            category: "Total",
            records: summary.total_records(),
        },
    ];
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    output.push_str(&table.to_string());

    output.push_str(&format!(
        "\n\nScanned {} DocType(s), skipped {} without customizations",
        summary.doctypes_scanned,
        summary.skipped.len()
    ));

    if !summary.failed.is_empty() {
        output.push_str(&format!(
            "\n\n✗ {} DocType(s) failed:\n",
            summary.failed.len()
        ));
        for (doctype, message) in &summary.failed {
            output.push_str(&format!("  {}: {}\n", doctype, message));
        }
    }
    output
}

/// Import every bundle in `path` (or the app's customizations directory).
pub async fn import<S: MetadataStore>(
    ctx: &SiteContext<S>,
    path: Option<&Path>,
    keep_going: bool,
    require_script_names: bool,
) -> CliResult<String> {
    let dir = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.app.customizations_dir());
    let options = ImportOptions {
        keep_going,
        require_script_names,
    };

    let summary = import_customizations(ctx, &dir, &options).await?;
    Ok(format_import_summary(&summary, &ctx.app.path, &dir))
}

pub fn format_import_summary(summary: &ImportSummary, app_path: &Path, dir: &Path) -> String {
    let mut output = format!(
        "✓ Imported {} file(s) from {}\n\n",
        summary.files.len(),
        display_path(dir, app_path)
    );

    if summary.files.is_empty() {
        output.push_str("No customization files found.");
    } else {
        let rows: Vec<FileRow> = summary
            .files
            .iter()
            .map(|report| FileRow {
                file: report.file.clone(),
                inserted: report.count(UpsertOutcome::Inserted),
                updated: report.count(UpsertOutcome::Updated),
                perms: match &report.perms {
                    Some(perms) => format!("{} replaced ({} removed)", perms.inserted, perms.removed),
                    None => "-".to_string(),
                },
            })
            .collect();
        let mut table = Table::new(rows);
        apply_table_style(&mut table);
        output.push_str(&table.to_string());
    }

    if !summary.failed.is_empty() {
        output.push_str(&format!("\n\n✗ {} file(s) failed:\n", summary.failed.len()));
        for failed in &summary.failed {
            output.push_str(&format!("  {}: {}\n", failed.file, failed.error));
        }
    }

    output
}
