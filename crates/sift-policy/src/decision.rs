//! The auto-confirm rule.
//!
//! `auto_confirm` is true iff the pattern is tested, marked `safe = true`,
//! and its success rate is at or above the threshold. Any other outcome
//! escalates the risk level to at least `Medium`.

use sift_core::config::AutoConfirmConfig;
use sift_core::constants::CURATED_CONFIDENCE_TIER;
use sift_core::event::{Captures, DecisionReason, EventMetadata, ExtractionEvent};
use sift_core::pattern::{Pattern, PatternCategory, RiskLevel};

use crate::risk::initial_risk;

/// Outcome of one decision, before it is folded into event metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub auto_confirm: bool,
    pub risk_level: RiskLevel,
    pub reason: DecisionReason,
}

/// The decision module, parameterized by its success-rate threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoConfirmPolicy {
    threshold: f64,
}

impl Default for AutoConfirmPolicy {
    fn default() -> Self {
        Self {
            threshold: CURATED_CONFIDENCE_TIER,
        }
    }
}

impl AutoConfirmPolicy {
    /// Threshold is clamped to [0, 1]; NaN falls back to the default.
    pub fn new(threshold: f64) -> Self {
        if threshold.is_nan() {
            return Self::default();
        }
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &AutoConfirmConfig) -> Self {
        Self::new(config.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Confirmation prompts, plus any pattern flagged `actionable`.
    pub fn applies_to(pattern: &Pattern) -> bool {
        pattern.category == PatternCategory::ConfirmationPrompt || pattern.metadata.is_actionable()
    }

    /// Evaluate the rule for `pattern`, starting from `current` risk.
    pub fn evaluate(&self, pattern: &Pattern, current: RiskLevel) -> Decision {
        if !Self::applies_to(pattern) {
            return Decision {
                auto_confirm: false,
                risk_level: current,
                reason: DecisionReason::NotApplicable,
            };
        }

        let reason = if !pattern.tested {
            DecisionReason::Untested
        } else if !pattern.metadata.is_safe() {
            DecisionReason::NotMarkedSafe
        } else if pattern.test_success_rate < self.threshold {
            DecisionReason::BelowThreshold
        } else {
            DecisionReason::Approved
        };

        match reason {
            DecisionReason::Approved => Decision {
                auto_confirm: true,
                risk_level: current,
                reason,
            },
            _ => Decision {
                auto_confirm: false,
                risk_level: current.max(RiskLevel::Medium),
                reason,
            },
        }
    }

    /// Return the event's metadata with the decision applied. The event itself
    /// is left untouched.
    pub fn decide(&self, event: &ExtractionEvent, pattern: &Pattern) -> EventMetadata {
        let decision = self.evaluate(pattern, event.metadata.risk_level);
        let mut metadata = event.metadata.clone();
        metadata.auto_confirm = decision.auto_confirm;
        metadata.risk_level = decision.risk_level;
        metadata.decision = Some(decision.reason);
        metadata
    }
}

/// Metadata an event carries before the decision: `auto_confirm = false`,
/// the initial risk, and the pattern's routing hints.
pub fn initial_metadata(pattern: &Pattern, captures: &Captures) -> EventMetadata {
    EventMetadata {
        auto_confirm: false,
        risk_level: initial_risk(pattern, captures),
        decision: None,
        action: pattern.action.clone(),
        target_worker: pattern.target_worker.clone(),
        extra: Default::default(),
    }
}
