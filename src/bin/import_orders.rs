//! CLI for loading a semicolon-delimited order export into the store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use salesboard_api::config::{init_tracing, load_config};
use salesboard_api::db::{establish_connection, run_migrations};
use salesboard_api::importer;
use salesboard_api::repositories::SeaOrmEntityStore;

#[derive(Debug, Parser)]
#[command(name = "import-orders", about = "Import an order CSV export")]
struct Cli {
    /// Path to the CSV file (semicolon-delimited)
    file: PathBuf,

    /// Database URL, overriding the configured one
    #[arg(long)]
    database_url: Option<String>,

    /// Apply pending migrations before importing
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    let database_url = cli
        .database_url
        .unwrap_or_else(|| config.database_url.clone());

    let db = Arc::new(
        establish_connection(&database_url)
            .await
            .context("failed to connect to database")?,
    );

    if cli.migrate {
        run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let store = SeaOrmEntityStore::new(db);
    let summary = importer::run(&cli.file, &store)
        .await
        .with_context(|| format!("import of {} failed", cli.file.display()))?;

    info!(
        lines_read = summary.lines_read,
        lines_created = summary.lines_created,
        errors = summary.errors,
        "import finished"
    );
    println!(
        "{} lines read, {} created, {} errors",
        summary.lines_read, summary.lines_created, summary.errors
    );

    Ok(())
}
