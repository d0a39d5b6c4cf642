use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::Error;
use crate::config::BackoffConfig;
use crate::pipeline::batcher::Batch;
use crate::table::{Mutation, TableHandle, retry_config};

/// Outcome of applying one batch
///
/// Tracks how many submissions the batch needed and how long the executor
/// waited between them.
#[must_use = "batch reports carry retry metrics that should be recorded"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// Mutations in the batch
    pub items: usize,
    /// Mutation calls made, the first submission included
    pub attempts: usize,
    /// Backoff delays waited before each resubmission
    pub delays: Vec<Duration>,
    /// Total execution time including all retries
    pub total_duration: Duration,
}

impl BatchReport {
    /// Number of resubmissions (0 means the first call applied everything)
    pub fn retry_count(&self) -> usize {
        self.delays.len()
    }
}

/// Applies batches to a destination until every mutation is accepted
///
/// Unprocessed mutations are resubmitted after a delay that starts at
/// `backoff.initial_delay` and doubles on every retry. There is no attempt
/// limit: partially applied batches are never dropped, so only an external
/// interruption stops a batch the backend keeps throttling.
#[derive(Debug)]
pub struct MutationExecutor<'a, D> {
    destination: &'a D,
    backoff: BackoffConfig,
}

impl<'a, D: TableHandle> MutationExecutor<'a, D> {
    /// Executor writing to `destination`
    pub fn new(destination: &'a D, backoff: BackoffConfig) -> Self {
        Self {
            destination,
            backoff,
        }
    }

    /// Apply one batch, resubmitting unprocessed mutations until none remain
    pub async fn apply(&self, batch: Batch<Mutation>) -> Result<BatchReport, Error> {
        let start_time = Instant::now();
        let items = batch.len();

        let mut pending = batch.into_items();
        let mut attempts = 0;
        let mut delays = Vec::new();

        loop {
            let submitted = pending.len();
            let sent = pending.clone();
            attempts += 1;

            let unprocessed = self.destination.apply_batch(pending).await?;

            if unprocessed.len() > submitted
                || !unprocessed.iter().all(|mutation| sent.contains(mutation))
            {
                return Err(Error::UnexpectedUnprocessed {
                    submitted,
                    unprocessed: unprocessed.len(),
                });
            }

            if unprocessed.is_empty() {
                break;
            }

            let delay = retry_config::retry_delay(
                u32::try_from(delays.len()).unwrap_or(u32::MAX),
                self.backoff.initial_delay,
                self.backoff.max_delay,
            );

            warn!(
                table = self.destination.name(),
                submitted,
                unprocessed = unprocessed.len(),
                attempt = attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "batch partially applied, resubmitting unprocessed items"
            );

            sleep(delay).await;
            delays.push(delay);
            pending = unprocessed;
        }

        let report = BatchReport {
            items,
            attempts,
            delays,
            total_duration: start_time.elapsed(),
        };

        debug!(
            table = self.destination.name(),
            items = report.items,
            attempts = report.attempts,
            "batch applied"
        );

        Ok(report)
    }
}
