use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Prometheus Metrics für Scan Pages, geschriebene Items, Batch Latency, Retries
pub struct Metrics {
    pub registry: Registry,
    pub pages_scanned: IntCounterVec,
    pub items_scanned: IntCounterVec,
    pub items_written: IntCounterVec,
    pub batches_written: IntCounterVec,
    pub batch_latency: HistogramVec,
    pub retries: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let pages_scanned = IntCounterVec::new(
            Opts::new("ddb_migrate_pages_scanned_total", "Scan pages read"),
            &["table"],
        )
        .expect("Failed to create pages_scanned metric");

        let items_scanned = IntCounterVec::new(
            Opts::new("ddb_migrate_items_scanned_total", "Items read from source tables"),
            &["table"],
        )
        .expect("Failed to create items_scanned metric");

        let items_written = IntCounterVec::new(
            Opts::new("ddb_migrate_items_written_total", "Items written to destination tables"),
            &["table"],
        )
        .expect("Failed to create items_written metric");

        let batches_written = IntCounterVec::new(
            Opts::new("ddb_migrate_batches_written_total", "BatchWriteItem calls acknowledged"),
            &["table"],
        )
        .expect("Failed to create batches_written metric");

        let batch_latency = HistogramVec::new(
            HistogramOpts::new(
                "ddb_migrate_batch_latency_seconds",
                "Batch write latency in seconds, including resubmits",
            ),
            &["table"],
        )
        .expect("Failed to create batch_latency metric");

        let retries = IntCounterVec::new(
            Opts::new("ddb_migrate_retries_total", "Resubmitted storage calls"),
            &["reason"],
        )
        .expect("Failed to create retries metric");

        registry.register(Box::new(pages_scanned.clone())).ok();
        registry.register(Box::new(items_scanned.clone())).ok();
        registry.register(Box::new(items_written.clone())).ok();
        registry.register(Box::new(batches_written.clone())).ok();
        registry.register(Box::new(batch_latency.clone())).ok();
        registry.register(Box::new(retries.clone())).ok();

        Self {
            registry,
            pages_scanned,
            items_scanned,
            items_written,
            batches_written,
            batch_latency,
            retries,
        }
    }

    pub fn record_page(&self, table: &str, items: usize) {
        self.pages_scanned.with_label_values(&[table]).inc();
        self.items_scanned
            .with_label_values(&[table])
            .inc_by(items as u64);
    }

    pub fn record_batch(&self, table: &str, items: usize, seconds: f64) {
        self.batches_written.with_label_values(&[table]).inc();
        self.items_written
            .with_label_values(&[table])
            .inc_by(items as u64);
        self.batch_latency.with_label_values(&[table]).observe(seconds);
    }

    pub fn record_retry(&self, reason: &str) {
        self.retries.with_label_values(&[reason]).inc();
    }

    /// Text Exposition Format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_by_table() {
        let metrics = Metrics::new();
        metrics.record_page("User-develop", 10);
        metrics.record_page("User-develop", 5);
        metrics.record_batch("User-dev", 15, 0.02);
        metrics.record_retry("unprocessed_items");

        assert_eq!(metrics.pages_scanned.with_label_values(&["User-develop"]).get(), 2);
        assert_eq!(metrics.items_scanned.with_label_values(&["User-develop"]).get(), 15);
        assert_eq!(metrics.items_written.with_label_values(&["User-dev"]).get(), 15);
        assert_eq!(metrics.retries.with_label_values(&["unprocessed_items"]).get(), 1);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = Metrics::new();
        metrics.record_batch("Plan-dev", 25, 0.1);

        let text = metrics.render().unwrap();
        assert!(text.contains("ddb_migrate_items_written_total{table=\"Plan-dev\"} 25"));
        assert!(text.contains("ddb_migrate_batch_latency_seconds"));
    }
}
