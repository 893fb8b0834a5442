//! Reducing collector.
//!
//! Folds every surviving element into a single accumulator, in source
//! order. Without an initial value the first survivor seeds the
//! accumulator and the reducer is first called for the second survivor.

use std::marker::PhantomData;

use crate::collector::{Collector, drive};
use crate::error::StreamError;
use crate::iter::LazyIter;
use crate::policy::FailurePolicy;
use crate::stage::{Outcome, Pipeline};

/// Marker: accumulator seeded by the first survivor.
#[derive(Debug, Clone, Copy)]
pub struct Unseeded;

/// Marker: accumulator seeded by an explicit initial value.
#[derive(Debug, Clone, Copy)]
pub struct Seeded;

/// Incremental fold over items of type `I`.
pub trait Fold<I> {
    type Output;

    fn fold_item(&mut self, item: I);

    fn finish(self) -> Self::Output;
}

/// Folds survivors with a reducer `(accumulator, current, index) -> accumulator`.
///
/// `index` is the position of `current` among the folded items. Stage
/// failures are skipped by default, so accumulator state built from earlier
/// elements survives later failures.
pub struct Reducing<A, F, M> {
    acc: Option<A>,
    reducer: F,
    folded: usize,
    policy: FailurePolicy,
    _seed: PhantomData<M>,
}

impl<T, F> Reducing<T, F, Unseeded>
where
    F: FnMut(T, T, usize) -> T,
{
    pub fn new(reducer: F) -> Self {
        Self {
            acc: None,
            reducer,
            folded: 0,
            policy: FailurePolicy::Skip,
            _seed: PhantomData,
        }
    }
}

impl<A, F> Reducing<A, F, Seeded> {
    pub fn with_initial(initial: A, reducer: F) -> Self {
        Self {
            acc: Some(initial),
            reducer,
            folded: 0,
            policy: FailurePolicy::Skip,
            _seed: PhantomData,
        }
    }
}

impl<A, F, M> Reducing<A, F, M> {
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fold each item of a sequence-valued survivor individually, one level
    /// deep, before moving on to the next element.
    pub fn flatten(self) -> Flattened<A, F, M> {
        Flattened { inner: self }
    }
}

impl<T, F> Fold<T> for Reducing<T, F, Unseeded>
where
    F: FnMut(T, T, usize) -> T,
{
    type Output = Option<T>;

    fn fold_item(&mut self, item: T) {
        let next = match self.acc.take() {
            None => item,
            Some(acc) => (self.reducer)(acc, item, self.folded),
        };
        self.acc = Some(next);
        self.folded += 1;
    }

    fn finish(self) -> Option<T> {
        self.acc
    }
}

impl<A, I, F> Fold<I> for Reducing<A, F, Seeded>
where
    F: FnMut(A, I, usize) -> A,
{
    type Output = Option<A>;

    fn fold_item(&mut self, item: I) {
        if let Some(acc) = self.acc.take() {
            self.acc = Some((self.reducer)(acc, item, self.folded));
        }
        self.folded += 1;
    }

    fn finish(self) -> Option<A> {
        self.acc
    }
}

impl<S, T, A, F, M> Collector<S, T> for Reducing<A, F, M>
where
    S: 'static,
    T: 'static,
    Self: Fold<T>,
{
    type Output = <Self as Fold<T>>::Output;

    async fn collect(mut self, iter: LazyIter<S>, stages: Pipeline<S, T>) -> Result<Self::Output, StreamError> {
        let policy = self.policy;
        drive(iter, &stages, |_, outcome| match outcome {
            Outcome::Value(value) => {
                self.fold_item(value);
                Ok(())
            }
            Outcome::Dropped { .. } => Ok(()),
            Outcome::Failed(failure) => policy.absorb(failure),
        })
        .await?;
        Ok(<Self as Fold<T>>::finish(self))
    }
}

/// A [`Reducing`] collector that flattens sequence-valued survivors.
pub struct Flattened<A, F, M> {
    inner: Reducing<A, F, M>,
}

impl<A, F, M> Flattened<A, F, M> {
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.inner.policy = policy;
        self
    }
}

impl<S, T, A, F, M> Collector<S, T> for Flattened<A, F, M>
where
    S: 'static,
    T: IntoIterator + 'static,
    Reducing<A, F, M>: Fold<T::Item>,
{
    type Output = <Reducing<A, F, M> as Fold<T::Item>>::Output;

    async fn collect(self, iter: LazyIter<S>, stages: Pipeline<S, T>) -> Result<Self::Output, StreamError> {
        let mut inner = self.inner;
        let policy = inner.policy;
        drive(iter, &stages, |_, outcome| match outcome {
            Outcome::Value(items) => {
                for item in items {
                    inner.fold_item(item);
                }
                Ok(())
            }
            Outcome::Dropped { .. } => Ok(()),
            Outcome::Failed(failure) => policy.absorb(failure),
        })
        .await?;
        Ok(<Reducing<A, F, M> as Fold<T::Item>>::finish(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collectors;
    use futures::future::ready;
    use std::convert::Infallible;

    fn numbers(items: Vec<i32>) -> LazyIter<i32> {
        LazyIter::from_vec(items)
    }

    #[tokio::test]
    async fn test_sum_without_initial() {
        let sum = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .collect(numbers(vec![1, 2, 3]), Pipeline::new())
            .await
            .unwrap();
        assert_eq!(sum, Some(6));
    }

    #[tokio::test]
    async fn test_first_survivor_seeds_accumulator() {
        let mut calls = Vec::new();
        let out = Collectors::reducing(|acc: String, cur: String, i| {
            calls.push((acc.clone(), cur.clone(), i));
            format!("{acc}+{cur}")
        })
        .collect(
            LazyIter::from_vec(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            Pipeline::new(),
        )
        .await
        .unwrap();

        assert_eq!(out.as_deref(), Some("a+b+c"));
        assert_eq!(
            calls,
            vec![
                ("a".to_string(), "b".to_string(), 1),
                ("a+b".to_string(), "c".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_without_initial_is_none() {
        let out = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .collect(numbers(vec![]), Pipeline::new())
            .await
            .unwrap();
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn test_initial_value_changes_type() {
        let total_len = Collectors::reducing_from(0usize, |acc, cur: String, _| acc + cur.len())
            .collect(
                LazyIter::from_vec(vec!["ab".to_string(), "cde".to_string()]),
                Pipeline::new(),
            )
            .await
            .unwrap();
        assert_eq!(total_len, Some(5));
    }

    #[tokio::test]
    async fn test_empty_with_initial_returns_initial() {
        let out = Collectors::reducing_from(10, |acc: i32, cur: i32, _| acc + cur)
            .collect(numbers(vec![]), Pipeline::new())
            .await
            .unwrap();
        assert_eq!(out, Some(10));
    }

    #[tokio::test]
    async fn test_dropped_elements_not_folded() {
        let stages = Pipeline::new().push("odd", |x: i32, _| {
            ready(Ok::<_, Infallible>(if x % 2 == 1 { Some(x) } else { None }))
        });
        let out = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .collect(numbers(vec![1, 2, 3, 4, 5]), stages)
            .await
            .unwrap();
        assert_eq!(out, Some(9));
    }

    #[tokio::test]
    async fn test_failures_skipped_by_default() {
        let stages = Pipeline::new().push("check", |x: i32, _| {
            ready(if x == 3 { Err("three") } else { Ok(Some(x)) })
        });
        let out = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .collect(numbers(vec![1, 2, 3, 4]), stages)
            .await
            .unwrap();
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn test_propagate_policy() {
        let stages = Pipeline::new().push("check", |x: i32, _| {
            ready(if x == 3 { Err("three") } else { Ok(Some(x)) })
        });
        let err = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .on_failure(FailurePolicy::Propagate)
            .collect(numbers(vec![1, 2, 3, 4]), stages)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Stage { index: 2, .. }));
    }

    #[tokio::test]
    async fn test_flatten_folds_inner_items_in_order() {
        let stages = Pipeline::new().push("pair", |x: i32, _| {
            ready(Ok::<_, Infallible>(Some(vec![x, x * 10])))
        });
        let out = Collectors::reducing_from(Vec::new(), |mut acc: Vec<i32>, cur: i32, _| {
            acc.push(cur);
            acc
        })
        .flatten()
        .collect(numbers(vec![1, 2]), stages)
        .await
        .unwrap();
        assert_eq!(out, Some(vec![1, 10, 2, 20]));
    }

    fn pair_or_fail_on_two() -> Pipeline<i32, Vec<i32>> {
        Pipeline::new().push("pair", |x: i32, _| {
            ready(if x == 2 { Err("two") } else { Ok(Some(vec![x, x * 10])) })
        })
    }

    fn push_all(mut acc: Vec<i32>, cur: i32, _: usize) -> Vec<i32> {
        acc.push(cur);
        acc
    }

    #[tokio::test]
    async fn test_flatten_skips_failures_by_default() {
        let out = Collectors::reducing_from(Vec::new(), push_all)
            .flatten()
            .collect(numbers(vec![1, 2, 3]), pair_or_fail_on_two())
            .await
            .unwrap();
        assert_eq!(out, Some(vec![1, 10, 3, 30]));
    }

    #[tokio::test]
    async fn test_flatten_propagate_policy() {
        let err = Collectors::reducing_from(Vec::new(), push_all)
            .flatten()
            .on_failure(FailurePolicy::Propagate)
            .collect(numbers(vec![1, 2, 3]), pair_or_fail_on_two())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Stage { stage: 0, index: 1, .. }));
    }

    #[tokio::test]
    async fn test_flatten_without_initial() {
        let out = Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)
            .flatten()
            .collect(LazyIter::from_vec(vec![vec![1, 2], vec![], vec![3]]), Pipeline::new())
            .await
            .unwrap();
        assert_eq!(out, Some(6));
    }
}
