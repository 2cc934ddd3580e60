mod catalog_stats;
mod decision_record;
mod evaluation;
mod learning_report;
mod match_record;
mod processing_report;

pub use catalog_stats::{CatalogStats, ChunkCounts};
pub use decision_record::DecisionRecord;
pub use evaluation::{EvaluationReport, LabeledSample};
pub use learning_report::{LearningReport, ProposedPattern};
pub use match_record::MatchRecord;
pub use processing_report::ProcessingReport;
