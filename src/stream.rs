//! Stream builders.
//!
//! [`stream`] wraps a source in a [`Stream`]. Registering a stage turns it
//! into a [`Staged`] builder that owns the lazy iterator and the stage list.
//! Nothing runs until a collector is handed the builder through `collect`,
//! which consumes it; a builder cannot be collected twice.

use std::convert::Infallible;
use std::future::Future;

use futures::future::ready;
use futures::stream::unfold;

use crate::collector::Collector;
use crate::error::{BoxError, StreamError};
use crate::iter::LazyIter;
use crate::pipe::Pipe;
use crate::source::{IntoSource, Source};
use crate::stage::Pipeline;

/// Construction state of a [`Stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Holds only the source sequence.
    Built,
    /// A lazy iterator has been derived; stages may be appended.
    Lazy,
}

enum Origin<T> {
    Built(Vec<T>),
    Lazy(LazyIter<T>),
}

/// A source with no stages registered yet.
pub struct Stream<T> {
    origin: Origin<T>,
}

/// Build a [`Stream`] over a sequence or an existing lazy iterator.
///
/// Fails with [`StreamError::InvalidSource`] when handed an iterator that
/// has already been driven to completion.
pub fn stream<I: IntoSource>(source: I) -> Result<Stream<I::Item>, StreamError> {
    match source.into_source() {
        Source::Sequence(items) => Ok(Stream {
            origin: Origin::Built(items),
        }),
        Source::Iterator(iter) if iter.is_exhausted() => Err(StreamError::InvalidSource(format!(
            "iterator source was already exhausted after {} elements",
            iter.position()
        ))),
        Source::Iterator(iter) => Ok(Stream {
            origin: Origin::Lazy(iter),
        }),
    }
}

impl<T: 'static> Stream<T> {
    /// Stream over an in-memory sequence.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            origin: Origin::Built(items),
        }
    }

    pub fn state(&self) -> StreamState {
        match self.origin {
            Origin::Built(_) => StreamState::Built,
            Origin::Lazy(_) => StreamState::Lazy,
        }
    }

    /// Derive the lazy iterator now if it does not exist yet.
    pub fn lazy(self) -> Self {
        Self {
            origin: Origin::Lazy(self.into_iter_lazy()),
        }
    }

    fn into_iter_lazy(self) -> LazyIter<T> {
        match self.origin {
            Origin::Built(items) => LazyIter::from_vec(items),
            Origin::Lazy(iter) => iter,
        }
    }

    /// Switch to stage registration with an empty stage list.
    pub fn staged(self) -> Staged<T, T> {
        Staged {
            iter: self.into_iter_lazy(),
            stages: Pipeline::new(),
        }
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Staged<T, U> {
        self.staged().map(f)
    }

    pub fn then<U, F, Fut>(self, f: F) -> Staged<T, U>
    where
        U: 'static,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = U> + 'static,
    {
        self.staged().then(f)
    }

    pub fn try_then<U, E, F, Fut>(self, f: F) -> Staged<T, U>
    where
        U: 'static,
        E: Into<BoxError>,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = Result<U, E>> + 'static,
    {
        self.staged().try_then(f)
    }

    pub fn filter(self, predicate: impl Fn(&T, usize) -> bool + 'static) -> Staged<T, T> {
        self.staged().filter(predicate)
    }

    pub fn filter_map<U: 'static>(self, f: impl Fn(T) -> Option<U> + 'static) -> Staged<T, U> {
        self.staged().filter_map(f)
    }

    pub fn stage<U, E, F, Fut>(self, name: &'static str, f: F) -> Staged<T, U>
    where
        U: 'static,
        E: Into<BoxError>,
        F: Fn(T, usize) -> Fut + 'static,
        Fut: Future<Output = Result<Option<U>, E>> + 'static,
    {
        self.staged().stage(name, f)
    }

    /// Fuse `pipe` into the iteration itself.
    ///
    /// Each source element runs through every function of `pipe` before the
    /// next one is pulled. The source is left untouched; each element gets
    /// its own working value. Stages registered afterwards apply to the
    /// pipe's output.
    pub fn pipe_map<U: 'static>(self, pipe: Pipe<T, U>) -> Stream<U> {
        let source = self.into_iter_lazy();
        let start = source.position();
        let fused = unfold((source, pipe), |(mut source, pipe)| async move {
            let (_, element) = source.pull().await?;
            let value = pipe.run(element).await;
            Some((value, (source, pipe)))
        });
        Stream {
            origin: Origin::Lazy(LazyIter::starting_at(fused, start)),
        }
    }

    /// Drive the source through `collector`. With no stages registered the
    /// source is replayed verbatim.
    pub async fn collect<C: Collector<T, T>>(self, collector: C) -> Result<C::Output, StreamError> {
        self.staged().collect(collector).await
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.origin {
            Origin::Built(_) => StreamState::Built,
            Origin::Lazy(_) => StreamState::Lazy,
        };
        f.debug_struct("Stream").field("state", &state).finish_non_exhaustive()
    }
}

/// A lazy iterator over `S` plus the stages turning each element into `T`.
pub struct Staged<S, T> {
    iter: LazyIter<S>,
    stages: Pipeline<S, T>,
}

impl<S: 'static, T: 'static> Staged<S, T> {
    /// Names of the registered stages, in order.
    pub fn stage_names(&self) -> &[&'static str] {
        self.stages.names()
    }

    /// Append a stage with the full stage contract: `Ok(Some(_))` passes a
    /// value on, `Ok(None)` drops the element, `Err(_)` rejects it.
    pub fn stage<U, E, F, Fut>(self, name: &'static str, f: F) -> Staged<S, U>
    where
        U: 'static,
        E: Into<BoxError>,
        F: Fn(T, usize) -> Fut + 'static,
        Fut: Future<Output = Result<Option<U>, E>> + 'static,
    {
        Staged {
            iter: self.iter,
            stages: self.stages.push(name, f),
        }
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Staged<S, U> {
        self.stage("map", move |value, _| ready(Ok::<_, Infallible>(Some(f(value)))))
    }

    pub fn then<U, F, Fut>(self, f: F) -> Staged<S, U>
    where
        U: 'static,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = U> + 'static,
    {
        self.stage("then", move |value, _| {
            let pending = f(value);
            async move { Ok::<_, Infallible>(Some(pending.await)) }
        })
    }

    pub fn try_then<U, E, F, Fut>(self, f: F) -> Staged<S, U>
    where
        U: 'static,
        E: Into<BoxError>,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = Result<U, E>> + 'static,
    {
        self.stage("try_then", move |value, _| {
            let pending = f(value);
            async move { pending.await.map(Some) }
        })
    }

    /// Keep elements for which `predicate(element, index)` holds. `index` is
    /// the element's position in the original source, not among survivors.
    pub fn filter(self, predicate: impl Fn(&T, usize) -> bool + 'static) -> Staged<S, T> {
        self.stage("filter", move |value, index| {
            let keep = predicate(&value, index);
            ready(Ok::<_, Infallible>(keep.then_some(value)))
        })
    }

    /// Map each element, dropping those for which `f` returns `None`.
    pub fn filter_map<U: 'static>(self, f: impl Fn(T) -> Option<U> + 'static) -> Staged<S, U> {
        self.stage("filter_map", move |value, _| ready(Ok::<_, Infallible>(f(value))))
    }

    pub async fn collect<C: Collector<S, T>>(self, collector: C) -> Result<C::Output, StreamError> {
        collector.collect(self.iter, self.stages).await
    }
}

impl<S, T> std::fmt::Debug for Staged<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staged")
            .field("iter", &self.iter)
            .field("stages", &self.stages)
            .finish()
    }
}
