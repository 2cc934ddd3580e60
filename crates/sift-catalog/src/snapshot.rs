//! Immutable, versioned view of the catalog handed to matchers.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use sift_core::pattern::{Pattern, PatternCategory, PatternId};

use crate::compiled::CompiledPattern;

/// Patterns in match order: tested first, then untested; inside each layer
/// by confidence descending, then name ascending.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    version: u64,
    patterns: Vec<Arc<CompiledPattern>>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<PatternId, usize>,
    tested: usize,
}

impl CatalogSnapshot {
    pub fn build(version: u64, patterns: Vec<Pattern>) -> Self {
        let mut compiled: Vec<Arc<CompiledPattern>> = patterns
            .into_iter()
            .map(|p| Arc::new(CompiledPattern::compile(p)))
            .collect();
        compiled.sort_by(|a, b| match_order(&a.pattern, &b.pattern));

        let by_name = compiled
            .iter()
            .enumerate()
            .map(|(i, c)| (c.pattern.name.clone(), i))
            .collect();
        let by_id = compiled
            .iter()
            .enumerate()
            .map(|(i, c)| (c.pattern.id, i))
            .collect();
        let tested = compiled.iter().filter(|c| c.pattern.tested).count();

        Self {
            version,
            patterns: compiled,
            by_name,
            by_id,
            tested,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Monotonic; bumped on every publish.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// All patterns in match order.
    pub fn patterns(&self) -> &[Arc<CompiledPattern>] {
        &self.patterns
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CompiledPattern>> {
        self.by_name.get(name).map(|&i| &self.patterns[i])
    }

    pub fn get_by_id(&self, id: PatternId) -> Option<&Arc<CompiledPattern>> {
        self.by_id.get(&id).map(|&i| &self.patterns[i])
    }

    pub fn by_category(&self, category: PatternCategory) -> impl Iterator<Item = &Pattern> {
        self.patterns
            .iter()
            .map(|c| &c.pattern)
            .filter(move |p| p.category == category)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn tested_count(&self) -> usize {
        self.tested
    }
}

/// The matching priority order.
pub fn match_order(a: &Pattern, b: &Pattern) -> Ordering {
    b.tested
        .cmp(&a.tested)
        .then_with(|| {
            b.confidence
                .value()
                .partial_cmp(&a.confidence.value())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::PatternDefinition;

    fn pattern(id: i64, name: &str, confidence: f64, tested: bool) -> Pattern {
        let mut def = PatternDefinition::new(name, "x", PatternCategory::Other)
            .with_confidence(confidence);
        if tested {
            def = def.tested(1.0);
        }
        let mut p = Pattern::from_definition(&def);
        p.id = id;
        p
    }

    #[test]
    fn tested_layer_precedes_untested_regardless_of_confidence() {
        let snap = CatalogSnapshot::build(
            1,
            vec![
                pattern(1, "untested_high", 0.99, false),
                pattern(2, "tested_low", 0.1, true),
                pattern(3, "tested_high", 0.9, true),
                pattern(4, "untested_low", 0.2, false),
            ],
        );
        let order: Vec<_> = snap.patterns().iter().map(|c| c.pattern.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["tested_high", "tested_low", "untested_high", "untested_low"]
        );
        assert_eq!(snap.tested_count(), 2);
    }

    #[test]
    fn equal_confidence_orders_by_name() {
        let snap = CatalogSnapshot::build(
            1,
            vec![pattern(1, "b", 0.5, true), pattern(2, "a", 0.5, true)],
        );
        assert_eq!(snap.patterns()[0].pattern.name, "a");
    }

    #[test]
    fn lookups_by_name_and_id() {
        let snap = CatalogSnapshot::build(7, vec![pattern(42, "p", 0.5, false)]);
        assert_eq!(snap.version(), 7);
        assert_eq!(snap.get("p").unwrap().pattern.id, 42);
        assert_eq!(snap.get_by_id(42).unwrap().pattern.name, "p");
        assert!(snap.get("q").is_none());
    }
}
