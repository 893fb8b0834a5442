//! Pipeline stages and the per-element outcome they produce.
//!
//! A stage takes one element and its source position and returns either a
//! transformed element, the drop sentinel (`None`), or an error. Stages are
//! accumulated into a [`Pipeline`] without running anything; a collector
//! applies the whole pipeline to each element as it is pulled.

use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::error::{BoxError, StreamError};

/// A stage that rejected an element.
#[derive(Debug)]
pub struct StageFailure {
    /// Position of the failing stage in registration order.
    pub stage: usize,
    /// Name of the failing stage.
    pub name: &'static str,
    /// Source position of the element being processed.
    pub index: usize,
    pub error: BoxError,
}

impl From<StageFailure> for StreamError {
    fn from(failure: StageFailure) -> Self {
        StreamError::Stage {
            stage: failure.stage,
            name: failure.name,
            index: failure.index,
            source: failure.error,
        }
    }
}

/// Result of pushing one element through a pipeline.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Every stage accepted the element.
    Value(T),
    /// Stage `stage` returned the drop sentinel; later stages were skipped.
    Dropped { stage: usize },
    /// A stage failed; later stages were skipped.
    Failed(StageFailure),
}

impl<T> Outcome<T> {
    /// The surviving value, if any.
    ///
    /// Dropped and failed outcomes both map to `None`; match on the outcome
    /// when the difference matters.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }
}

type Chain<S, T> = Rc<dyn Fn(S, usize) -> LocalBoxFuture<'static, Outcome<T>>>;

/// An ordered list of stages turning source elements `S` into outputs `T`.
pub struct Pipeline<S, T> {
    names: Vec<&'static str>,
    chain: Chain<S, T>,
}

impl<S: 'static> Pipeline<S, S> {
    /// A pipeline with no stages; every element passes through unchanged.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            chain: Rc::new(|element: S, _: usize| async move { Outcome::Value(element) }.boxed_local()),
        }
    }
}

impl<S: 'static> Default for Pipeline<S, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, T: 'static> Pipeline<S, T> {
    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Stage names in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Run every stage, in order, on one element.
    pub async fn apply(&self, element: S, index: usize) -> Outcome<T> {
        (self.chain)(element, index).await
    }

    /// Append a stage.
    ///
    /// `f` returns `Ok(Some(_))` to pass a value on, `Ok(None)` to drop the
    /// element, or `Err(_)` to reject it. It is only invoked for elements
    /// that every earlier stage accepted.
    pub fn push<U, F, Fut, E>(self, name: &'static str, f: F) -> Pipeline<S, U>
    where
        U: 'static,
        F: Fn(T, usize) -> Fut + 'static,
        Fut: Future<Output = Result<Option<U>, E>> + 'static,
        E: Into<BoxError>,
    {
        let stage = self.names.len();
        let prev = self.chain;
        let f = Rc::new(f);
        let chain: Chain<S, U> = Rc::new(move |element: S, index: usize| {
            let prev = Rc::clone(&prev);
            let f = Rc::clone(&f);
            async move {
                match prev(element, index).await {
                    Outcome::Value(value) => match f(value, index).await {
                        Ok(Some(next)) => Outcome::Value(next),
                        Ok(None) => Outcome::Dropped { stage },
                        Err(error) => Outcome::Failed(StageFailure {
                            stage,
                            name,
                            index,
                            error: error.into(),
                        }),
                    },
                    Outcome::Dropped { stage } => Outcome::Dropped { stage },
                    Outcome::Failed(failure) => Outcome::Failed(failure),
                }
            }
            .boxed_local()
        });

        let mut names = self.names;
        names.push(name);
        Pipeline { names, chain }
    }
}

impl<S, T> std::fmt::Debug for Pipeline<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("names", &self.names).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::ready;
    use std::cell::RefCell;
    use std::convert::Infallible;

    fn keep<T>(value: T) -> futures::future::Ready<Result<Option<T>, Infallible>> {
        ready(Ok(Some(value)))
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes_through() {
        let pipeline: Pipeline<i32, i32> = Pipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply(7, 0).await.into_value(), Some(7));
    }

    #[tokio::test]
    async fn test_stages_run_in_registration_order() {
        let pipeline = Pipeline::new()
            .push("add", |x: i32, _| keep(x + 1))
            .push("double", |x: i32, _| keep(x * 2));
        assert_eq!(pipeline.names(), &["add", "double"]);
        assert_eq!(pipeline.apply(3, 0).await.into_value(), Some(8));
    }

    #[tokio::test]
    async fn test_stage_changes_element_type() {
        let pipeline = Pipeline::<&str, &str>::new().push("len", |s, _| keep(s.len()));
        assert_eq!(pipeline.apply("abcd", 0).await.into_value(), Some(4));
    }

    #[tokio::test]
    async fn test_drop_short_circuits() {
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        let pipeline = Pipeline::new()
            .push("drop", |_: i32, _| ready(Ok::<Option<i32>, Infallible>(None)))
            .push("count", move |x: i32, _| {
                *seen.borrow_mut() += 1;
                keep(x)
            });

        let outcome = pipeline.apply(1, 0).await;
        assert!(matches!(outcome, Outcome::Dropped { stage: 0 }));
        assert_eq!(*calls.borrow(), 0);
    }

    #[tokio::test]
    async fn test_failure_records_stage_and_index() {
        let pipeline = Pipeline::new()
            .push("ok", |x: i32, _| keep(x))
            .push("fail", |_: i32, _| ready(Err::<Option<i32>, _>("nope")));

        match pipeline.apply(5, 3).await {
            Outcome::Failed(failure) => {
                assert_eq!(failure.stage, 1);
                assert_eq!(failure.name, "fail");
                assert_eq!(failure.index, 3);
                assert_eq!(failure.error.to_string(), "nope");
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stage_receives_source_index() {
        let pipeline = Pipeline::new().push("index", |_: char, i| keep(i));
        assert_eq!(pipeline.apply('z', 42).await.into_value(), Some(42));
    }

    #[tokio::test]
    async fn test_async_stage_is_awaited() {
        let pipeline = Pipeline::new().push("wait", |x: i32, _| async move {
            tokio::task::yield_now().await;
            Ok::<_, Infallible>(Some(x * 10))
        });
        assert_eq!(pipeline.apply(4, 0).await.into_value(), Some(40));
    }

    #[tokio::test]
    async fn test_into_value_none_for_dropped_and_failed() {
        let pipeline = Pipeline::new().push("check", |x: i32, _| {
            ready(match x {
                0 => Ok(None),
                1 => Err("one"),
                _ => Ok(Some(x)),
            })
        });
        assert_eq!(pipeline.apply(0, 0).await.into_value(), None);
        assert_eq!(pipeline.apply(1, 1).await.into_value(), None);
        assert_eq!(pipeline.apply(2, 2).await.into_value(), Some(2));
    }
}
