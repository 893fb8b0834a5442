//! Fused pipes: several functions applied back to back inside one
//! iteration step.
//!
//! Unlike a [`Pipeline`](crate::Pipeline), a pipe has no drop sentinel and
//! no failure path. Each element flows through every function, each one
//! awaited before the next starts, and the final value is yielded before
//! the next source element is pulled.

use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

type Step<S, T> = Rc<dyn Fn(S) -> LocalBoxFuture<'static, T>>;

/// Left-to-right composition of element functions from `S` to `T`.
pub struct Pipe<S, T> {
    len: usize,
    run: Step<S, T>,
}

impl<S: 'static> Pipe<S, S> {
    pub fn new() -> Self {
        Self {
            len: 0,
            run: Rc::new(|element: S| async move { element }.boxed_local()),
        }
    }
}

impl<S: 'static> Default for Pipe<S, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, T: 'static> Pipe<S, T> {
    /// Append an async function.
    pub fn then<U, F, Fut>(self, f: F) -> Pipe<S, U>
    where
        U: 'static,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = U> + 'static,
    {
        let prev = self.run;
        let f = Rc::new(f);
        Pipe {
            len: self.len + 1,
            run: Rc::new(move |element: S| {
                let prev = Rc::clone(&prev);
                let f = Rc::clone(&f);
                async move {
                    let working = prev(element).await;
                    f(working).await
                }
                .boxed_local()
            }),
        }
    }

    /// Append a synchronous function.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Pipe<S, U> {
        self.then(move |value| futures::future::ready(f(value)))
    }

    /// Number of composed functions.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run every function on one element.
    pub async fn run(&self, element: S) -> T {
        (self.run)(element).await
    }
}
