use serde::{Deserialize, Serialize};

use supervisor::looping::LoopStop;

use crate::evaluate::Evaluation;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Fail,
    Stuck,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Fail => "fail",
            Outcome::Stuck => "stuck",
        }
    }
}

pub fn classify_outcome(stop: LoopStop, evaluation: &Evaluation) -> Outcome {
    match stop {
        LoopStop::Complete if evaluation.valid_output => Outcome::Success,
        LoopStop::Complete => Outcome::Fail,
        LoopStop::IterationLimit => Outcome::Stuck,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(valid: bool) -> Evaluation {
        Evaluation {
            valid_output: valid,
            validation_errors: Vec::new(),
            objective_coverage: 1.0,
            artifact_count: 0,
        }
    }

    #[test]
    fn success_when_complete_and_valid() {
        assert_eq!(
            classify_outcome(LoopStop::Complete, &evaluation(true)),
            Outcome::Success
        );
    }

    #[test]
    fn fail_when_complete_but_invalid() {
        assert_eq!(
            classify_outcome(LoopStop::Complete, &evaluation(false)),
            Outcome::Fail
        );
    }

    #[test]
    fn stuck_when_iteration_limit_reached() {
        assert_eq!(
            classify_outcome(LoopStop::IterationLimit, &evaluation(true)),
            Outcome::Stuck
        );
    }
}
