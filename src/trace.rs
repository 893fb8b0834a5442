//! Trace types for a traced collect run.
//!
//! A trace records what happened to every pulled element: whether it
//! survived the whole stage list, or which stage dropped or rejected it.

use crate::stage::Outcome;

/// What became of one pulled element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fate {
    /// Survived every stage and reached the result.
    Kept,
    /// Dropped by the stage at this position.
    Dropped { stage: usize },
    /// Rejected by the stage at this position.
    Failed { stage: usize, message: String },
}

impl Fate {
    pub fn of<T>(outcome: &Outcome<T>) -> Self {
        match outcome {
            Outcome::Value(_) => Fate::Kept,
            Outcome::Dropped { stage } => Fate::Dropped { stage: *stage },
            Outcome::Failed(failure) => Fate::Failed {
                stage: failure.stage,
                message: failure.error.to_string(),
            },
        }
    }
}

/// Journey of one element through the stage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTrace {
    /// Source position of the element.
    pub index: usize,
    pub fate: Fate,
}

/// Complete trace of a collect run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectTrace {
    /// Names of each stage in registration order.
    pub stage_names: Vec<String>,
    /// One entry per pulled element, in pull order.
    pub elements: Vec<ElementTrace>,
}

impl CollectTrace {
    pub fn kept(&self) -> usize {
        self.elements.iter().filter(|e| e.fate == Fate::Kept).count()
    }

    /// Number of elements dropped by the stage at `stage`.
    pub fn dropped_at(&self, stage: usize) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.fate, Fate::Dropped { stage: s } if s == stage))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.fate, Fate::Failed { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageFailure;

    #[test]
    fn test_fate_of_outcomes() {
        assert_eq!(Fate::of(&Outcome::Value(1)), Fate::Kept);
        assert_eq!(Fate::of(&Outcome::<i32>::Dropped { stage: 2 }), Fate::Dropped { stage: 2 });

        let failed: Outcome<i32> = Outcome::Failed(StageFailure {
            stage: 0,
            name: "try_then",
            index: 3,
            error: "bad json".into(),
        });
        assert_eq!(
            Fate::of(&failed),
            Fate::Failed {
                stage: 0,
                message: "bad json".to_string()
            }
        );
    }

    #[test]
    fn test_trace_counts() {
        let trace = CollectTrace {
            stage_names: vec!["map".to_string(), "filter".to_string()],
            elements: vec![
                ElementTrace { index: 0, fate: Fate::Kept },
                ElementTrace { index: 1, fate: Fate::Dropped { stage: 1 } },
                ElementTrace { index: 2, fate: Fate::Dropped { stage: 1 } },
                ElementTrace {
                    index: 3,
                    fate: Fate::Failed {
                        stage: 0,
                        message: "x".to_string(),
                    },
                },
            ],
        };
        assert_eq!(trace.kept(), 1);
        assert_eq!(trace.dropped_at(1), 2);
        assert_eq!(trace.dropped_at(0), 0);
        assert_eq!(trace.failed(), 1);
    }

    #[test]
    fn test_empty_trace() {
        let trace = CollectTrace::default();
        assert!(trace.stage_names.is_empty());
        assert_eq!(trace.kept(), 0);
    }
}
