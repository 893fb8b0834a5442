//! Single-use lazy iterator over a source of elements.
//!
//! A `LazyIter` is the unit of laziness: nothing is produced until a
//! consumer pulls, and each pull yields at most one element. The producer
//! behind it may be an in-memory sequence or any single-threaded async
//! stream (for example one that performs a network call per element).

use futures::stream::{self, LocalBoxStream, StreamExt};

/// A pull-based cursor that yields elements one at a time.
///
/// Every element is paired with its position in the original source.
/// Once a pull observes the end of the source the iterator is exhausted
/// and stays that way; it cannot be restarted.
pub struct LazyIter<T> {
    inner: LocalBoxStream<'static, T>,
    position: usize,
    exhausted: bool,
}

impl<T: 'static> LazyIter<T> {
    /// Iterate over an in-memory sequence.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_stream(stream::iter(items))
    }

    /// Iterate over an externally supplied async producer.
    pub fn from_stream(producer: impl futures::Stream<Item = T> + 'static) -> Self {
        Self::starting_at(producer, 0)
    }

    /// Iterate over a producer whose first element sits at `position` in the
    /// original source.
    pub(crate) fn starting_at(producer: impl futures::Stream<Item = T> + 'static, position: usize) -> Self {
        Self {
            inner: producer.boxed_local(),
            position,
            exhausted: false,
        }
    }

    /// Pull the next element and its source position.
    ///
    /// Suspends while the underlying producer waits. Returns `None` once
    /// the source is exhausted, and on every call after that.
    pub async fn pull(&mut self) -> Option<(usize, T)> {
        if self.exhausted {
            return None;
        }
        match self.inner.next().await {
            Some(item) => {
                let index = self.position;
                self.position += 1;
                Some((index, item))
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }
}

impl<T> LazyIter<T> {
    /// Position the next pulled element will have.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether a pull has already observed the end of the source.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<T: 'static> From<Vec<T>> for LazyIter<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> std::fmt::Debug for LazyIter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyIter")
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
