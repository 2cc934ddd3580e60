use serde::{Deserialize, Serialize};

use crate::pattern::PatternId;

/// A historical line with the expected outcome for one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub line: String,
    pub should_match: bool,
}

impl LabeledSample {
    pub fn positive(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            should_match: true,
        }
    }

    pub fn negative(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            should_match: false,
        }
    }
}

/// Outcome of evaluating a pattern against labeled samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub pattern_id: PatternId,
    pub pattern_name: String,
    pub samples: usize,
    pub correct: usize,
    pub success_rate: f64,
    /// Positive samples that did not match.
    pub false_negatives: Vec<String>,
    /// Negative samples that matched.
    pub false_positives: Vec<String>,
}
