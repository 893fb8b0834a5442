//! What a collector does when a stage rejects an element.

use crate::error::StreamError;
use crate::stage::StageFailure;

/// Failure handling for a single collect run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run and return the failure; partial results are discarded.
    Propagate,
    /// Treat the element as having produced no value and keep going.
    Skip,
}

impl FailurePolicy {
    /// Apply the policy to one failure.
    pub fn absorb(self, failure: StageFailure) -> Result<(), StreamError> {
        match self {
            FailurePolicy::Propagate => Err(failure.into()),
            FailurePolicy::Skip => {
                tracing::warn!(
                    stage = failure.stage,
                    name = failure.name,
                    index = failure.index,
                    error = %failure.error,
                    "skipping element rejected by stage"
                );
                Ok(())
            }
        }
    }
}
