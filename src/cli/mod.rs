//! Command-line front end.
//!
//! Resolves the bench, site and app, opens one connection to the site's
//! database and runs a single command against it.

mod commands;
pub mod error;
pub mod utils;

#[cfg(test)]
mod utils_test;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Bench;
use crate::context::{AppInfo, DEFAULT_USER, SiteContext};
use crate::db::SiteStore;
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "frappe-customs")]
#[command(author, version, about = "Export and import Frappe DocType customizations", long_about = None)]
pub struct Cli {
    /// Bench directory containing apps/ and sites/
    #[arg(long, global = true, env = "FRAPPE_BENCH_PATH", default_value = ".")]
    pub bench: PathBuf,

    /// Site to connect to (default: sites/currentsite.txt, then default_site)
    #[arg(long, global = true, env = "FRAPPE_SITE")]
    pub site: Option<String>,

    /// App whose package directory receives exported files
    #[arg(long, global = true, env = "FRAPPE_APP")]
    pub app: Option<String>,

    /// Session user recorded as owner/modified_by on writes
    #[arg(long, global = true, default_value = DEFAULT_USER)]
    pub user: String,

    /// Database URL (mysql://... or sqlite://...), overriding the site config
    #[arg(long, global = true, env = "FRAPPE_CUSTOMS_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the definition of every DocType belonging to the app
    ExportAllDocs,
    /// Export customizations as one JSON file per DocType
    ExportCustomizations {
        /// Comma-separated DocTypes (default: every non-custom DocType)
        #[arg(long, default_value = "")]
        doctypes: String,
        /// Output directory (default: <app>/customizations)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Only include scripts that reference the exported DocType
        #[arg(long)]
        scope_scripts: bool,
    },
    /// Import every customization file in a directory
    ImportCustomizations {
        /// Input directory (default: <app>/customizations)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Roll back a failing file and continue with the rest
        #[arg(long)]
        keep_going: bool,
        /// Fail on scripts without a name instead of inserting them
        #[arg(long)]
        require_script_names: bool,
    },
    /// Export DocType definitions, then customizations to the default path
    QuickExport,
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "frappe_customs=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Build the site context the command runs against.
async fn connect(cli: &Cli) -> CliResult<SiteContext<SiteStore>> {
    let app = cli.app.as_deref().ok_or(CliError::MissingApp)?;
    let bench = Bench::new(&cli.bench);

    let site = match &cli.database_url {
        Some(_) => cli.site.clone().unwrap_or_default(),
        None => bench.resolve_site(cli.site.as_deref())?,
    };
    let store = bench
        .open_store(&site, cli.database_url.as_deref())
        .await?;

    Ok(SiteContext::new(store, AppInfo::new(app, bench.app_path(app))).with_user(&cli.user))
}

pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing();

    let ctx = connect(&cli).await?;

    let output = match cli.command {
        Commands::ExportAllDocs => commands::docs::export_all_docs(&ctx).await?,
        Commands::ExportCustomizations {
            doctypes,
            path,
            scope_scripts,
        } => {
            commands::customizations::export(&ctx, &doctypes, path.as_deref(), scope_scripts)
                .await?
        }
        Commands::ImportCustomizations {
            path,
            keep_going,
            require_script_names,
        } => {
            commands::customizations::import(
                &ctx,
                path.as_deref(),
                keep_going,
                require_script_names,
            )
            .await?
        }
        Commands::QuickExport => commands::docs::quick_export(&ctx).await?,
    };

    println!("{}", output);
    Ok(())
}
