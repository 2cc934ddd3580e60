//! A pattern paired with its compiled expression.

use regex::{Regex, RegexBuilder};

use sift_core::errors::MatchEvaluationError;
use sift_core::event::Captures;
use sift_core::pattern::Pattern;

/// Upper bound on a compiled program, so one hostile expression cannot eat memory.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Compile an expression with the catalog's limits.
pub fn compile_regex(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub pattern: Pattern,
    regex: Option<Regex>,
    compile_error: Option<String>,
}

impl CompiledPattern {
    /// Never fails: a stored expression that no longer compiles is kept with
    /// its error and reported at match time.
    pub fn compile(pattern: Pattern) -> Self {
        match compile_regex(&pattern.regex) {
            Ok(regex) => Self {
                pattern,
                regex: Some(regex),
                compile_error: None,
            },
            Err(e) => Self {
                pattern,
                regex: None,
                compile_error: Some(e.to_string()),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    pub fn compile_error(&self) -> Option<&str> {
        self.compile_error.as_deref()
    }

    /// Match a line. `Ok(None)` is a clean miss.
    pub fn captures(&self, line: &str) -> Result<Option<Captures>, MatchEvaluationError> {
        let regex = self.regex.as_ref().ok_or_else(|| MatchEvaluationError {
            pattern_id: self.pattern.id,
            pattern_name: self.pattern.name.clone(),
            reason: self
                .compile_error
                .clone()
                .unwrap_or_else(|| "expression unavailable".to_string()),
        })?;

        let Some(caps) = regex.captures(line) else {
            return Ok(None);
        };
        let mut out = Captures::new();
        for (idx, name) in regex.capture_names().enumerate().skip(1) {
            if let Some(m) = caps.get(idx) {
                let key = name.map_or_else(|| idx.to_string(), str::to_string);
                out.insert(key, m.as_str().to_string());
            }
        }
        Ok(Some(out))
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{PatternCategory, PatternDefinition};

    fn compiled(regex: &str) -> CompiledPattern {
        CompiledPattern::compile(Pattern::from_definition(&PatternDefinition::new(
            "p",
            regex,
            PatternCategory::Other,
        )))
    }

    #[test]
    fn positional_groups_are_keyed_by_index() {
        let p = compiled(r"⏺ Bash\((.+)\)");
        let caps = p.captures("⏺ Bash(ls -lh)").unwrap().unwrap();
        assert_eq!(caps.len(), 1);
        assert_eq!(caps["1"], "ls -lh");
    }

    #[test]
    fn named_groups_are_keyed_by_name() {
        let p = compiled(r"(?P<tool>\w+)\((?P<arg>.*)\) took (\d+)ms");
        let caps = p.captures("Read(a.rs) took 12ms").unwrap().unwrap();
        assert_eq!(caps["tool"], "Read");
        assert_eq!(caps["arg"], "a.rs");
        assert_eq!(caps["3"], "12");
    }

    #[test]
    fn non_participating_groups_are_omitted() {
        let p = compiled(r"done(?: in (\d+)s)?");
        let caps = p.captures("done").unwrap().unwrap();
        assert!(caps.is_empty());
    }

    #[test]
    fn broken_expression_reports_at_match_time() {
        let p = compiled(r"(unclosed");
        assert!(!p.is_valid());
        let err = p.captures("anything").unwrap_err();
        assert_eq!(err.pattern_name, "p");
        assert!(!p.is_match("anything"));
    }
}
