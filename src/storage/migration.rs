//! Tabellenmigration DynamoDB → DynamoDB
//! Scan der Quelltabelle, Batches zu max. 25 Items, BatchWriteItem in die Zieltabelle
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::storage::dynamodb::TableStore;
use crate::storage::error::MigrationError;
use crate::storage::models::{Batcher, Item, ScanRequest, TableMapping, TableReport};
use crate::storage::retry::RetryPolicy;
use crate::utils::config::MigrationSettings;
use crate::utils::Metrics;

/// Optionen für eine einzelne Tabellenkopie
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOptions {
    pub batch_size: usize,
    pub page_size: Option<i32>,
    pub consistent_read: bool,
    pub dry_run: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self::from(&MigrationSettings::default())
    }
}

impl From<&MigrationSettings> for CopyOptions {
    fn from(settings: &MigrationSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            page_size: settings.page_size,
            consistent_read: settings.consistent_read,
            dry_run: settings.dry_run,
        }
    }
}

/// Kopiert alle Items einer Tabelle in eine andere
pub struct TableCopier<S: TableStore> {
    store: Arc<S>,
    options: CopyOptions,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
}

impl<S: TableStore> TableCopier<S> {
    pub fn new(store: Arc<S>, options: CopyOptions, retry: RetryPolicy, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            options,
            retry,
            metrics,
        }
    }

    /// Kopiere `source` vollständig nach `destination`.
    ///
    /// Geschriebene Batches werden sofort abgeschickt, sobald der Scan genug
    /// Items geliefert hat. Der erste Fehler bricht die Kopie ab.
    pub async fn copy(&self, source: &str, destination: &str) -> Result<TableReport, MigrationError> {
        let started = Instant::now();
        let mut report = TableReport {
            source: source.to_string(),
            destination: destination.to_string(),
            dry_run: self.options.dry_run,
            ..TableReport::default()
        };

        let mut batcher = Batcher::new(self.options.batch_size);
        let mut start_key: Option<Item> = None;

        loop {
            let request = ScanRequest {
                table_name: source.to_string(),
                exclusive_start_key: start_key.take(),
                limit: self.options.page_size,
                consistent_read: self.options.consistent_read,
            };

            let page = self
                .retry
                .run("scan", &self.metrics, || self.store.scan_page(request.clone()))
                .await
                .map_err(|e| MigrationError::scan(source, e))?;

            report.pages_scanned += 1;
            report.items_scanned += page.items.len() as u64;
            self.metrics.record_page(source, page.items.len());

            tracing::debug!(
                table = source,
                page = report.pages_scanned,
                items = page.items.len(),
                more = page.last_evaluated_key.is_some(),
                "Scanned page"
            );

            for batch in batcher.push(page.items) {
                self.write_batch(destination, batch, &mut report).await?;
            }

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        if let Some(batch) = batcher.finish() {
            self.write_batch(destination, batch, &mut report).await?;
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Schreibe einen Batch, unverarbeitete Items werden mit Backoff erneut gesendet
    async fn write_batch(
        &self,
        destination: &str,
        batch: Vec<Item>,
        report: &mut TableReport,
    ) -> Result<(), MigrationError> {
        let batch_len = batch.len();
        report.batches_written += 1;

        if self.options.dry_run {
            return Ok(());
        }

        let started = Instant::now();
        let mut pending = batch;
        let mut backoff = self.retry.strategy();

        loop {
            let outcome = self
                .retry
                .run("batch_write", &self.metrics, || {
                    self.store.batch_write(destination, pending.clone())
                })
                .await
                .map_err(|e| MigrationError::write(destination, e))?;

            if outcome.unprocessed.is_empty() {
                break;
            }

            let remaining = outcome.unprocessed.len();
            match backoff.next() {
                Some(delay) => {
                    self.metrics.record_retry("unprocessed_items");
                    tracing::warn!(
                        table = destination,
                        remaining,
                        delay_ms = delay.as_millis() as u64,
                        "Resubmitting unprocessed items"
                    );
                    tokio::time::sleep(delay).await;
                    pending = outcome.unprocessed;
                }
                None => {
                    return Err(MigrationError::UnprocessedItems {
                        table: destination.to_string(),
                        remaining,
                    })
                }
            }
        }

        report.items_written += batch_len as u64;
        self.metrics
            .record_batch(destination, batch_len, started.elapsed().as_secs_f64());

        tracing::debug!(
            table = destination,
            batch = report.batches_written,
            items = batch_len,
            "Batch written"
        );

        Ok(())
    }
}

/// Zusammenfassung eines kompletten Laufs
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
}

impl MigrationSummary {
    pub fn total_items_written(&self) -> u64 {
        self.tables.iter().map(|t| t.items_written).sum()
    }
}

/// Führt die Tabellenkopien nacheinander in der konfigurierten Reihenfolge aus
pub struct Migrator<S: TableStore> {
    copier: TableCopier<S>,
}

impl<S: TableStore> Migrator<S> {
    pub fn new(copier: TableCopier<S>) -> Self {
        Self { copier }
    }

    pub async fn run(&self, mappings: &[TableMapping]) -> Result<MigrationSummary, MigrationError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut tables = Vec::with_capacity(mappings.len());

        tracing::info!(%run_id, tables = mappings.len(), "Starting migration run");

        for mapping in mappings {
            tracing::info!(
                %run_id,
                source = %mapping.source,
                destination = %mapping.destination,
                "Migrating {} to {}",
                mapping.source,
                mapping.destination
            );

            let report = self
                .copier
                .copy(&mapping.source, &mapping.destination)
                .await
                .map_err(|e| {
                    tracing::error!(%run_id, table = e.table(), error = %e, "Migration aborted");
                    e
                })?;

            tracing::info!(
                %run_id,
                source = %report.source,
                destination = %report.destination,
                items = report.items_written,
                batches = report.batches_written,
                pages = report.pages_scanned,
                elapsed_ms = report.elapsed_ms,
                dry_run = report.dry_run,
                "Table migrated"
            );

            tables.push(report);
        }

        Ok(MigrationSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tables,
        })
    }
}
