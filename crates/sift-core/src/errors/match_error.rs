/// A single pattern could not be evaluated against a line.
#[derive(Debug, Clone, thiserror::Error)]
#[error("pattern {pattern_id} ('{pattern_name}') failed evaluation: {reason}")]
pub struct MatchEvaluationError {
    pub pattern_id: i64,
    pub pattern_name: String,
    pub reason: String,
}
