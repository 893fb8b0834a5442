//! # lazy-pipe
//!
//! Lazy, pull-based pipelines over elements whose production or
//! transformation may have to wait (for example, one network call per
//! element).
//!
//! ## Overview
//!
//! - **Lazy iterator**: a single-use cursor that yields one element per pull
//! - **Stages**: element-wise map and filter steps, registered up front and
//!   run only when a collector pulls
//! - **Fused pipes**: several functions applied back to back inside one
//!   iteration step
//! - **Collectors**: terminal strategies that drive the iterator and fold
//!   survivors into a sequence or a single value
//!
//! Processing is strictly sequential: element `i` finishes its whole stage
//! chain before element `i + 1` is requested.
//!
//! ## Example
//!
//! ```
//! use futures::executor::block_on;
//! use lazy_pipe::{Collectors, stream};
//!
//! let doubled = block_on(
//!     stream(vec![1, 2, 3, 4, 5])
//!         .unwrap()
//!         .map(|x| x * 2)
//!         .filter(|x, _| *x > 4)
//!         .collect(Collectors::to_vec()),
//! )
//! .unwrap();
//! assert_eq!(doubled, vec![6, 8, 10]);
//!
//! let sum = block_on(
//!     stream(vec![1, 2, 3])
//!         .unwrap()
//!         .collect(Collectors::reducing(|acc: i32, cur: i32, _| acc + cur)),
//! )
//! .unwrap();
//! assert_eq!(sum, Some(6));
//! ```

pub mod collector;
pub mod error;
pub mod iter;
pub mod pipe;
pub mod policy;
pub mod reduce;
pub mod source;
pub mod stage;
pub mod stream;
pub mod trace;

pub use collector::{Collector, Collectors, ToVec, Traced};
pub use error::{BoxError, StreamError};
pub use iter::LazyIter;
pub use pipe::Pipe;
pub use policy::FailurePolicy;
pub use reduce::{Flattened, Fold, Reducing, Seeded, Unseeded};
pub use source::{IntoSource, Source, read_lines};
pub use stage::{Outcome, Pipeline, StageFailure};
pub use stream::{Staged, Stream, StreamState, stream};
pub use trace::{CollectTrace, ElementTrace, Fate};
