//! Stream sources: in-memory sequences or existing lazy iterators.

use std::fs;
use std::path::Path;

use crate::error::StreamError;
use crate::iter::LazyIter;

/// Where a [`Stream`](crate::Stream) takes its elements from.
#[derive(Debug)]
pub enum Source<T> {
    /// An ordered, finite, in-memory sequence.
    Sequence(Vec<T>),
    /// An iterator created elsewhere, possibly backed by an async producer.
    Iterator(LazyIter<T>),
}

/// Conversion into a [`Source`] with a single, unambiguous element type.
pub trait IntoSource {
    type Item;

    fn into_source(self) -> Source<Self::Item>;
}

impl<T> IntoSource for Source<T> {
    type Item = T;

    fn into_source(self) -> Source<T> {
        self
    }
}

impl<T> IntoSource for Vec<T> {
    type Item = T;

    fn into_source(self) -> Source<T> {
        Source::Sequence(self)
    }
}

impl<T> IntoSource for LazyIter<T> {
    type Item = T;

    fn into_source(self) -> Source<T> {
        Source::Iterator(self)
    }
}

/// Read a text file into a sequence of lines, skipping empty ones.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>, StreamError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| StreamError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
