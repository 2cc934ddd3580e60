//! Definition checks shared by register and reload.

use std::collections::HashSet;

use sift_core::errors::{SiftError, SiftResult};
use sift_core::pattern::PatternDefinition;

use crate::compiled::compile_regex;

/// Check one definition in isolation: name, expression, numeric ranges.
pub fn validate_definition(def: &PatternDefinition) -> SiftResult<()> {
    if def.name.trim().is_empty() {
        return Err(SiftError::invalid_pattern(&def.name, "name must not be empty"));
    }
    if def.regex.is_empty() {
        return Err(SiftError::invalid_pattern(&def.name, "regex must not be empty"));
    }
    compile_regex(&def.regex)
        .map_err(|e| SiftError::invalid_pattern(&def.name, format!("regex does not compile: {e}")))?;
    check_unit_range(&def.name, "confidence", def.confidence)?;
    check_unit_range(&def.name, "test_success_rate", def.test_success_rate)?;
    Ok(())
}

/// Validate a whole batch and reject duplicate names inside it.
pub fn validate_batch(defs: &[PatternDefinition]) -> SiftResult<()> {
    let mut seen = HashSet::new();
    for def in defs {
        validate_definition(def)?;
        if !seen.insert(def.name.as_str()) {
            return Err(SiftError::invalid_pattern(&def.name, "duplicate name in catalog file"));
        }
    }
    Ok(())
}

pub fn check_unit_range(name: &str, field: &str, value: f64) -> SiftResult<()> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(SiftError::invalid_pattern(
            name,
            format!("{field} must be within [0, 1], got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::PatternCategory;

    fn def(name: &str, regex: &str) -> PatternDefinition {
        PatternDefinition::new(name, regex, PatternCategory::Other)
    }

    #[test]
    fn accepts_a_sane_definition() {
        assert!(validate_definition(&def("ok", r"Error: (\d+)")).is_ok());
    }

    #[test]
    fn rejects_bad_regex_empty_name_and_ranges() {
        assert!(validate_definition(&def("bad", "(")).is_err());
        assert!(validate_definition(&def("  ", "x")).is_err());
        assert!(validate_definition(&def("c", "x").with_confidence(1.01)).is_err());
        assert!(validate_definition(&def("r", "x").tested(-0.1)).is_err());
        assert!(validate_definition(&def("n", "x").with_confidence(f64::NAN)).is_err());
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(validate_definition(&def("lo", "x").with_confidence(0.0)).is_ok());
        assert!(validate_definition(&def("hi", "x").with_confidence(1.0).tested(1.0)).is_ok());
    }

    #[test]
    fn batch_rejects_duplicates() {
        let err = validate_batch(&[def("a", "x"), def("a", "y")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
