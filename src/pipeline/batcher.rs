use futures_util::{Stream, TryStream, TryStreamExt, stream};

use crate::Error;
use crate::table::MAX_BATCH_SIZE;

/// Up to [`MAX_BATCH_SIZE`] elements submitted in one mutation call
#[must_use = "a batch should be applied or its items are lost"]
#[derive(Clone, Debug, PartialEq)]
pub struct Batch<T> {
    items: Vec<T>,
}

impl<T> Batch<T> {
    /// Number of elements in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements in arrival order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The first `count` elements, for previews
    pub fn sample(&self, count: usize) -> &[T] {
        &self.items[..count.min(self.items.len())]
    }

    /// Consume the batch into its elements
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Groups a stream of elements into fixed-size batches
///
/// Order is preserved and nothing is deduplicated. Only the last batch of a
/// run may be short, and an empty input produces no batch at all.
#[derive(Debug)]
pub struct Batcher<T> {
    size: usize,
    buffer: Vec<T>,
}

impl<T> Batcher<T> {
    /// Batcher emitting batches of `size` elements
    pub fn new(size: usize) -> Result<Self, Error> {
        if size == 0 || size > MAX_BATCH_SIZE {
            return Err(Error::InvalidOptions(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {size}"
            )));
        }

        Ok(Self {
            size,
            buffer: Vec::with_capacity(size),
        })
    }

    /// Configured batch size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add one element, returning a batch once `size` elements are buffered
    pub fn push(&mut self, item: T) -> Option<Batch<T>> {
        self.buffer.push(item);

        if self.buffer.len() < self.size {
            return None;
        }

        let items = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.size));
        Some(Batch { items })
    }

    /// Emit whatever is buffered as the final, possibly short, batch
    pub fn finish(&mut self) -> Option<Batch<T>> {
        if self.buffer.is_empty() {
            return None;
        }

        Some(Batch {
            items: std::mem::take(&mut self.buffer),
        })
    }

    /// Lazily batch a fallible stream of elements
    ///
    /// An error from `input` is passed through and ends the batch stream;
    /// the partially filled buffer is discarded.
    pub fn batches<S>(self, input: S) -> impl Stream<Item = Result<Batch<T>, Error>>
    where
        S: TryStream<Ok = T, Error = Error>,
    {
        let input = Box::pin(input.into_stream());

        stream::try_unfold(
            (self, Some(input)),
            |(mut batcher, input)| async move {
                let Some(mut input) = input else {
                    return Ok(None);
                };

                while let Some(item) = input.try_next().await? {
                    if let Some(batch) = batcher.push(item) {
                        return Ok(Some((batch, (batcher, Some(input)))));
                    }
                }

                Ok::<_, Error>(batcher.finish().map(|batch| (batch, (batcher, None))))
            },
        )
    }
}
