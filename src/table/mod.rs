mod batch;
mod helpers;
mod operations;
mod types;

pub(crate) use helpers::retry_config;
pub use operations::DynamoTable;
pub use types::{
    Cursor, Item, ItemKey, KeySchema, MAX_BATCH_SIZE, Mutation, Page, PageRequest, TableSummary,
};

use std::future::Future;

use crate::Error;

/// A table the pipeline can read from and apply mutations to
///
/// [`DynamoTable`] talks to DynamoDB; tests substitute in-memory tables.
pub trait TableHandle {
    /// Table name used in logs and confirmation
    fn name(&self) -> &str;

    /// Describe the table: name, approximate item count and key schema
    fn describe(&self) -> impl Future<Output = Result<TableSummary, Error>>;

    /// Fetch exactly one page of items
    ///
    /// A page without a cursor is the last one. An empty table yields a
    /// single empty page without a cursor.
    fn read_page(&self, request: PageRequest<'_>) -> impl Future<Output = Result<Page, Error>>;

    /// Submit one batch of mutations
    ///
    /// Returns the subset of `pending` the backend declined to apply; an
    /// empty vector means the whole batch was applied.
    fn apply_batch(
        &self,
        pending: Vec<Mutation>,
    ) -> impl Future<Output = Result<Vec<Mutation>, Error>>;
}
