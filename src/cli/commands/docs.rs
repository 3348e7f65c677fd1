//! DocType definition export commands.

use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, display_path};
use crate::context::SiteContext;
use crate::db::MetadataStore;
use crate::sync::{DocExportSummary, ExportOptions, export_customizations};

#[derive(Tabled)]
struct DocRow {
    #[tabled(rename = "DocType")]
    doctype: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Export the definition of every DocType in the app.
pub async fn export_all_docs<S: MetadataStore>(ctx: &SiteContext<S>) -> CliResult<String> {
    let summary = crate::sync::export_all_docs(ctx).await?;
    Ok(format_doc_summary(&summary, ctx))
}

/// Definitions first, then every customization into the default directory.
pub async fn quick_export<S: MetadataStore>(ctx: &SiteContext<S>) -> CliResult<String> {
    let mut output = export_all_docs(ctx).await?;

    let dir = ctx.app.customizations_dir();
    let summary = export_customizations(ctx, None, &dir, &ExportOptions::default()).await?;
    output.push_str("\n\n");
    output.push_str(&super::customizations::format_export_summary(&summary, &dir));
    Ok(output)
}

fn format_doc_summary<S: MetadataStore>(summary: &DocExportSummary, ctx: &SiteContext<S>) -> String {
    if summary.total() == 0 {
        return format!("⚠ No doctypes found for {}", ctx.app.name);
    }

    let mut rows: Vec<DocRow> = summary
        .exported
        .iter()
        .map(|(doctype, path)| DocRow {
            doctype: doctype.clone(),
            status: "✓",
            detail: display_path(path, &ctx.app.path),
        })
        .collect();
    rows.extend(summary.failed.iter().map(|(doctype, error)| DocRow {
        doctype: doctype.clone(),
        status: "✗",
        detail: error.clone(),
    }));

    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    format!(
        "✓ Exported {} of {} doctypes\n\n{}",
        summary.exported.len(),
        summary.total(),
        table
    )
}
