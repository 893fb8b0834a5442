//! Terminal collectors.
//!
//! A collector drives a [`LazyIter`] to exhaustion, pushing each element
//! through the registered [`Pipeline`] before pulling the next one. Element
//! `i`'s whole stage chain completes before element `i + 1` is requested,
//! so the producer is never asked for more than one element ahead.

use crate::error::StreamError;
use crate::iter::LazyIter;
use crate::policy::FailurePolicy;
use crate::reduce::{Reducing, Seeded, Unseeded};
use crate::stage::{Outcome, Pipeline};
use crate::trace::{CollectTrace, ElementTrace, Fate};

/// A terminal strategy that folds a stream's surviving elements into a value.
///
/// Implementations are free to choose how survivors are combined and what
/// to do with failed elements; [`ToVec`], [`Traced`], and
/// [`Reducing`] are the shipped variants.
#[allow(async_fn_in_trait)]
pub trait Collector<S, T> {
    type Output;

    async fn collect(self, iter: LazyIter<S>, stages: Pipeline<S, T>) -> Result<Self::Output, StreamError>;
}

/// Per-run counters, logged when a run finishes.
#[derive(Debug, Default)]
struct Tally {
    pulled: usize,
    kept: usize,
    dropped: usize,
    failed: usize,
}

/// Pull every element from `iter`, apply `stages`, and hand each outcome
/// to `on_outcome` before pulling the next element.
///
/// Stops at the first error returned by `on_outcome`.
pub(crate) async fn drive<S, T>(
    mut iter: LazyIter<S>,
    stages: &Pipeline<S, T>,
    mut on_outcome: impl FnMut(usize, Outcome<T>) -> Result<(), StreamError>,
) -> Result<(), StreamError>
where
    S: 'static,
    T: 'static,
{
    if iter.is_exhausted() {
        return Err(StreamError::CollectorType(format!(
            "iterator was already exhausted after {} elements",
            iter.position()
        )));
    }

    let mut tally = Tally::default();
    while let Some((index, element)) = iter.pull().await {
        tally.pulled += 1;
        let outcome = stages.apply(element, index).await;
        match &outcome {
            Outcome::Value(_) => tally.kept += 1,
            Outcome::Dropped { stage } => {
                tally.dropped += 1;
                tracing::trace!(index, stage, "element dropped");
            }
            Outcome::Failed(_) => tally.failed += 1,
        }
        on_outcome(index, outcome)?;
    }

    tracing::debug!(
        stages = stages.len(),
        pulled = tally.pulled,
        kept = tally.kept,
        dropped = tally.dropped,
        failed = tally.failed,
        "collect finished"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Ordered sequence
// ---------------------------------------------------------------------------

/// Collects survivors into a `Vec` in source order.
#[derive(Debug, Clone, Copy)]
pub struct ToVec {
    policy: FailurePolicy,
}

impl ToVec {
    pub fn new() -> Self {
        Self {
            policy: FailurePolicy::Propagate,
        }
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for ToVec {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, T: 'static> Collector<S, T> for ToVec {
    type Output = Vec<T>;

    async fn collect(self, iter: LazyIter<S>, stages: Pipeline<S, T>) -> Result<Vec<T>, StreamError> {
        let mut out = Vec::new();
        drive(iter, &stages, |_, outcome| match outcome {
            Outcome::Value(value) => {
                out.push(value);
                Ok(())
            }
            Outcome::Dropped { .. } => Ok(()),
            Outcome::Failed(failure) => self.policy.absorb(failure),
        })
        .await?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Traced ordered sequence
// ---------------------------------------------------------------------------

/// Collects survivors like [`ToVec`] and records each element's fate.
#[derive(Debug, Clone, Copy)]
pub struct Traced {
    policy: FailurePolicy,
}

impl Traced {
    pub fn new() -> Self {
        Self {
            policy: FailurePolicy::Propagate,
        }
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for Traced {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, T: 'static> Collector<S, T> for Traced {
    type Output = (Vec<T>, CollectTrace);

    async fn collect(self, iter: LazyIter<S>, stages: Pipeline<S, T>) -> Result<Self::Output, StreamError> {
        let mut out = Vec::new();
        let mut trace = CollectTrace {
            stage_names: stages.names().iter().map(|name| name.to_string()).collect(),
            elements: Vec::new(),
        };

        drive(iter, &stages, |index, outcome| {
            trace.elements.push(ElementTrace {
                index,
                fate: Fate::of(&outcome),
            });
            match outcome {
                Outcome::Value(value) => {
                    out.push(value);
                    Ok(())
                }
                Outcome::Dropped { .. } => Ok(()),
                Outcome::Failed(failure) => self.policy.absorb(failure),
            }
        })
        .await?;

        Ok((out, trace))
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Constructors for the shipped collectors.
pub struct Collectors;

impl Collectors {
    /// Ordered sequence of survivors; stage failures propagate.
    pub fn to_vec() -> ToVec {
        ToVec::new()
    }

    /// Ordered sequence of survivors plus a [`CollectTrace`].
    pub fn traced() -> Traced {
        Traced::new()
    }

    /// Fold survivors with `reducer`, seeding the accumulator with the
    /// first survivor. Stage failures are skipped.
    pub fn reducing<T, F>(reducer: F) -> Reducing<T, F, Unseeded>
    where
        F: FnMut(T, T, usize) -> T,
    {
        Reducing::new(reducer)
    }

    /// Fold survivors into `initial` with `reducer`. Stage failures are
    /// skipped.
    pub fn reducing_from<A, T, F>(initial: A, reducer: F) -> Reducing<A, F, Seeded>
    where
        F: FnMut(A, T, usize) -> A,
    {
        Reducing::with_initial(initial, reducer)
    }
}
