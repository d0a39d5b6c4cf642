use futures_util::{Stream, TryStreamExt, stream};
use tracing::debug;

use crate::Error;
use crate::table::{Cursor, Item, KeySchema, Page, PageRequest, TableHandle};

enum ScanState {
    Start,
    Resume(Cursor),
}

/// Cursor-paginated full-table scan
///
/// Each page is requested only after the previous page's cursor is known,
/// and the cursor is forwarded untouched. The sequence ends after the first
/// page without a cursor; a read error ends it after yielding the error.
#[derive(Clone, Copy, Debug)]
pub struct PageSource<'a, T> {
    table: &'a T,
    consistent: bool,
    limit: Option<u32>,
    key_only: Option<&'a KeySchema>,
}

impl<'a, T: TableHandle> PageSource<'a, T> {
    /// Scan every item of `table`
    pub fn new(table: &'a T) -> Self {
        Self {
            table,
            consistent: false,
            limit: None,
            key_only: None,
        }
    }

    /// Request strongly consistent pages
    pub fn consistent(mut self, consistent: bool) -> Self {
        self.consistent = consistent;
        self
    }

    /// Page size hint passed to every read
    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Read only the key attributes of each item
    pub fn key_only(mut self, key_schema: &'a KeySchema) -> Self {
        self.key_only = Some(key_schema);
        self
    }

    /// Lazy sequence of pages
    pub fn pages(self) -> impl Stream<Item = Result<Page, Error>> {
        let Self {
            table,
            consistent,
            limit,
            key_only,
        } = self;

        stream::try_unfold(
            (Some(ScanState::Start), 0usize),
            move |(state, page_number)| async move {
                let cursor = match state {
                    None => return Ok(None),
                    Some(ScanState::Start) => None,
                    Some(ScanState::Resume(cursor)) => Some(cursor),
                };

                let page = table
                    .read_page(PageRequest {
                        cursor: cursor.as_ref(),
                        consistent,
                        limit,
                        key_only,
                    })
                    .await?;

                debug!(
                    table = table.name(),
                    page = page_number,
                    items = page.items.len(),
                    "read page"
                );

                let next = page.cursor.clone().map(ScanState::Resume);
                Ok::<_, Error>(Some((page, (next, page_number + 1))))
            },
        )
    }

    /// Lazy sequence of items across all pages, in scan order
    pub fn items(self) -> impl Stream<Item = Result<Item, Error>> {
        self.pages()
            .map_ok(|page| tokio_stream::iter(page.items.into_iter().map(Ok::<_, Error>)))
            .try_flatten()
    }
}
