mod storage;
mod utils;


use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

use storage::{CopyOptions, DynamoDBStore, Migrator, RetryPolicy, TableCopier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env vor Logging laden, damit RUST_LOG greift
    dotenvy::dotenv().ok();

    let args = utils::Args::parse();

    // Initialize logging
    utils::init_logging(args.log_format);

    let mut settings = utils::Settings::load(args.config.as_deref())
        .context("failed to load configuration")?;
    args.apply(&mut settings);
    settings.validate().context("invalid configuration")?;

    tracing::info!(
        tables = settings.tables.len(),
        region = ?settings.aws.region,
        profile = ?settings.aws.profile,
        batch_size = settings.migration.batch_size,
        dry_run = settings.migration.dry_run,
        "Starting DynamoDB table migration"
    );

    // Initialize storage layer
    let store = Arc::new(
        DynamoDBStore::new(&settings.aws)
            .await
            .context("failed to configure DynamoDB client")?,
    );

    // Initialize metrics
    let metrics = Arc::new(utils::Metrics::new());

    let copier = TableCopier::new(
        store,
        CopyOptions::from(&settings.migration),
        RetryPolicy::from(&settings.retry),
        metrics.clone(),
    );

    let result = Migrator::new(copier).run(&settings.tables).await;

    if let Some(path) = &args.metrics_file {
        std::fs::write(path, metrics.render()?)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }

    let summary = result?;

    tracing::info!(
        run_id = %summary.run_id,
        tables = summary.tables.len(),
        items = summary.total_items_written(),
        "Migration finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
