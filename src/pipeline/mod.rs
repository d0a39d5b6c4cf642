mod batcher;
mod confirm;
mod executor;
mod source;
mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use batcher::{Batch, Batcher};
pub use confirm::{
    ConfirmationGate, LARGE_TABLE_THRESHOLD, Operation, PREVIEW_SIZE, Prompt, TerminalPrompt,
};
pub use executor::{BatchReport, MutationExecutor};
pub use source::PageSource;
pub use transform::{
    Identity, ShellTransformer, Transform, Transformer, item_to_json, json_to_item,
};

use futures_util::{Stream, TryStreamExt, future};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info};

use crate::Error;
use crate::config::PipelineOptions;
use crate::table::{Mutation, TableHandle};

/// Totals for a run that applied every batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Batches applied
    pub batches: usize,
    /// Items written or deleted
    pub items: usize,
    /// Resubmissions of unprocessed items across all batches
    pub retries: usize,
}

impl RunSummary {
    fn record(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.items += report.items;
        self.retries += report.retry_count();
    }
}

/// How a run ended
#[derive(Debug)]
pub enum RunResult {
    /// Every batch was applied
    Success(RunSummary),
    /// The source produced no items; nothing was prompted or written
    EmptySource,
    /// The operator did not confirm; nothing was written
    Cancelled,
    /// The run stopped at the first unrecoverable error
    ///
    /// Batches applied before the error stay applied. Running again is
    /// safe because every mutation is idempotent per key.
    Failed(Error),
}

impl RunResult {
    /// Whether the run completed without error (including empty and cancelled runs)
    pub fn is_ok(&self) -> bool {
        !matches!(self, RunResult::Failed(_))
    }

    /// The run totals, when every batch was applied
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunResult::Success(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Scan, transform, batch, confirm and apply
///
/// With a destination, every source item is transformed and put into the
/// destination. Without one, the source is scanned for its keys and every
/// item is deleted from it. Batches are applied strictly one after another;
/// the first batch waits for the operator's confirmation unless
/// `assume_yes` is set.
#[derive(Debug)]
pub struct Pipeline<P, X = Transform> {
    options: PipelineOptions,
    prompt: P,
    transformer: X,
}

impl<P: Prompt> Pipeline<P> {
    /// Pipeline using the transform command from `options`, if any
    pub fn new(options: PipelineOptions, prompt: P) -> Self {
        let transformer = Transform::from_command(options.transform.as_deref());
        Self {
            options,
            prompt,
            transformer,
        }
    }
}

impl<P: Prompt, X: Transformer> Pipeline<P, X> {
    /// Replace the transformation applied to copied items
    pub fn with_transformer<Y: Transformer>(self, transformer: Y) -> Pipeline<P, Y> {
        Pipeline {
            options: self.options,
            prompt: self.prompt,
            transformer,
        }
    }

    /// Options of this pipeline
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The prompt used for confirmation
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Copy `source` into `destination`, or truncate `source` when there is no destination
    pub async fn run<S, D>(&mut self, source: &S, destination: Option<&D>) -> RunResult
    where
        S: TableHandle,
        D: TableHandle,
    {
        let start_time = Instant::now();

        match self.try_run(source, destination).await {
            Ok(result) => {
                info!(
                    duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "run finished"
                );
                result
            }
            Err(e) => {
                error!(
                    error = %e,
                    "run failed; batches already applied remain, re-running is safe"
                );
                RunResult::Failed(e)
            }
        }
    }

    async fn try_run<S, D>(&mut self, source: &S, destination: Option<&D>) -> Result<RunResult, Error>
    where
        S: TableHandle,
        D: TableHandle,
    {
        self.options.validate(destination.is_none())?;
        let batcher = Batcher::new(self.options.batch_size)?;

        let source_summary = source.describe().await?;
        let pages = PageSource::new(source)
            .consistent(self.options.consistent_read)
            .limit(self.options.page_size);

        match destination {
            Some(destination) => {
                let destination_summary = destination.describe().await?;
                info!(
                    source = %source_summary.name,
                    destination = %destination_summary.name,
                    estimated_items = source_summary.item_count,
                    "starting copy"
                );

                let gate = ConfirmationGate::new(Operation::Copy {
                    source: source_summary,
                    destination: destination_summary,
                });
                let transformer = &self.transformer;
                let mutations = pages.items().and_then(move |item| async move {
                    transformer.transform(item).await.map(Mutation::Put)
                });

                drive(
                    batcher.batches(mutations),
                    &MutationExecutor::new(destination, self.options.backoff.clone()),
                    &gate,
                    &mut self.prompt,
                    self.options.assume_yes,
                )
                .await
            }
            None => {
                info!(
                    table = %source_summary.name,
                    estimated_items = source_summary.item_count,
                    key = %source_summary.key_schema,
                    "starting truncate"
                );

                let key_schema = source_summary.key_schema.clone();
                let gate = ConfirmationGate::new(Operation::Truncate {
                    target: source_summary,
                });
                let mutations = pages.key_only(&key_schema).items().and_then(|item| {
                    future::ready(
                        key_schema
                            .project(source.name(), &item)
                            .map(Mutation::Delete),
                    )
                });

                drive(
                    batcher.batches(mutations),
                    &MutationExecutor::new(source, self.options.backoff.clone()),
                    &gate,
                    &mut self.prompt,
                    self.options.assume_yes,
                )
                .await
            }
        }
    }
}

async fn drive<St, D, P>(
    batches: St,
    executor: &MutationExecutor<'_, D>,
    gate: &ConfirmationGate,
    prompt: &mut P,
    assume_yes: bool,
) -> Result<RunResult, Error>
where
    St: Stream<Item = Result<Batch<Mutation>, Error>>,
    D: TableHandle,
    P: Prompt,
{
    let mut batches = std::pin::pin!(batches);

    let Some(first) = batches.try_next().await? else {
        info!(table = gate.token(), "source is empty, nothing to do");
        return Ok(RunResult::EmptySource);
    };

    if assume_yes {
        info!(table = gate.token(), "confirmation skipped");
    } else if !gate.confirm(&first, prompt)? {
        info!(table = gate.token(), "not confirmed, no changes made");
        return Ok(RunResult::Cancelled);
    }

    let mut summary = RunSummary::default();
    let mut next = Some(first);

    while let Some(batch) = next {
        let report = executor.apply(batch).await?;
        summary.record(&report);

        info!(
            table = gate.token(),
            batch = summary.batches,
            items = summary.items,
            retries = report.retry_count(),
            "applied batch"
        );

        next = batches.try_next().await?;
    }

    info!(
        table = gate.token(),
        batches = summary.batches,
        items = summary.items,
        retries = summary.retries,
        "all batches applied"
    );

    Ok(RunResult::Success(summary))
}

/// Run one pipeline with `options`
///
/// Copies `source` into `destination`, or truncates `source` when
/// `destination` is `None`.
pub async fn run_pipeline<S, D, P>(
    source: &S,
    destination: Option<&D>,
    options: &PipelineOptions,
    prompt: &mut P,
) -> RunResult
where
    S: TableHandle,
    D: TableHandle,
    P: Prompt,
{
    Pipeline::new(options.clone(), prompt)
        .run(source, destination)
        .await
}

/// Copy every item of `source` into `destination`
pub async fn copy_table<S, D, P>(
    source: &S,
    destination: &D,
    options: &PipelineOptions,
    prompt: &mut P,
) -> RunResult
where
    S: TableHandle,
    D: TableHandle,
    P: Prompt,
{
    run_pipeline(source, Some(destination), options, prompt).await
}

/// Delete every item of `target`
pub async fn truncate_table<T, P>(target: &T, options: &PipelineOptions, prompt: &mut P) -> RunResult
where
    T: TableHandle,
    P: Prompt,
{
    run_pipeline::<T, T, P>(target, None, options, prompt).await
}
