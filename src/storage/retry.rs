use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use super::error::StorageError;
use crate::utils::config::RetrySettings;
use crate::utils::Metrics;

/// Exponential Backoff für einzelne Scan und BatchWrite Calls
///
/// `max_attempts` zählt den ersten Call mit, `1` heißt also kein Retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    /// Wartezeiten: 2x, 4x, 8x ... base_delay, gedeckelt bei max_delay
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        let base_ms = self.base_delay.as_millis().max(1) as u64;
        let with_jitter = self.jitter;
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(self.max_delay)
            .map(move |d| if with_jitter { jitter(d) } else { d })
            .take(self.max_attempts.saturating_sub(1))
    }

    /// Führt `op` aus bis Erfolg, nicht retrybarer Fehler oder keine Versuche mehr.
    /// Jeder Retry zählt in `ddb_migrate_retries_total` unter `operation`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        metrics: &Metrics,
        op: F,
    ) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        RetryIf::start(self.strategy(), op, |err: &StorageError| {
            let retry = err.is_retryable();
            if retry {
                metrics.record_retry(operation);
                tracing::warn!(operation, error = %err, "Retrying storage call");
            }
            retry
        })
        .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            jitter: true,
        }
    }
}
