//! Scoring a pattern against labeled historical lines.

use sift_core::models::{EvaluationReport, LabeledSample};

use crate::compiled::CompiledPattern;

/// Score `compiled` against `samples`. A broken expression matches nothing.
pub fn score(compiled: &CompiledPattern, samples: &[LabeledSample]) -> EvaluationReport {
    let mut correct = 0;
    let mut false_negatives = Vec::new();
    let mut false_positives = Vec::new();

    for sample in samples {
        let matched = compiled.is_match(&sample.line);
        match (matched, sample.should_match) {
            (true, true) | (false, false) => correct += 1,
            (false, true) => false_negatives.push(sample.line.clone()),
            (true, false) => false_positives.push(sample.line.clone()),
        }
    }

    let success_rate = if samples.is_empty() {
        0.0
    } else {
        correct as f64 / samples.len() as f64
    };

    EvaluationReport {
        pattern_id: compiled.pattern.id,
        pattern_name: compiled.pattern.name.clone(),
        samples: samples.len(),
        correct,
        success_rate,
        false_negatives,
        false_positives,
    }
}
