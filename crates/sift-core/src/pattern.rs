//! Pattern model: the catalog entry that classifies one category of output line.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PATTERN_CONFIDENCE;

/// Row id of a pattern in the catalog.
pub type PatternId = i64;

/// What kind of line a pattern recognizes. Also the event type of every
/// event produced by the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    ToolUse,
    Error,
    StateChange,
    ConfirmationPrompt,
    StateInfo,
    Other,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 6] = [
        Self::ToolUse,
        Self::Error,
        Self::StateChange,
        Self::ConfirmationPrompt,
        Self::StateInfo,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToolUse => "tool_use",
            Self::Error => "error",
            Self::StateChange => "state_change",
            Self::ConfirmationPrompt => "confirmation_prompt",
            Self::StateInfo => "state_info",
            Self::Other => "other",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who created a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposedBy {
    #[default]
    Manual,
    Learned,
}

impl ProposedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Learned => "learned",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "learned" => Some(Self::Learned),
            _ => None,
        }
    }
}

/// Escalation tier attached to events. Ordered: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score clamped to [0.0, 1.0]. Used as the matching-priority weight.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new Confidence, clamping to [0.0, 1.0]. NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(DEFAULT_PATTERN_CONFIDENCE)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// Typed pattern metadata. The recognized keys are fields; anything else
/// lands in `extra` and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetadata {
    /// Whether answering the prompt automatically is considered safe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    /// Marks a non-prompt pattern as subject to the auto-confirm decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actionable: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PatternMetadata {
    pub fn is_safe(&self) -> bool {
        self.safe == Some(true)
    }

    pub fn is_actionable(&self) -> bool {
        self.actionable == Some(true)
    }
}

/// A catalog entry as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    pub regex: String,
    pub category: PatternCategory,
    pub confidence: Confidence,
    pub action: Option<String>,
    pub target_worker: Option<String>,
    pub tested: bool,
    /// Meaningful only when `tested` is true.
    pub test_success_rate: f64,
    pub proposed_by: ProposedBy,
    pub metadata: PatternMetadata,
    pub match_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_matched: Option<DateTime<Utc>>,
}

impl Pattern {
    /// Build an unsaved pattern (id 0) from a definition.
    /// Numeric fields are clamped here; range validation belongs to the catalog.
    pub fn from_definition(def: &PatternDefinition) -> Self {
        Self {
            id: 0,
            name: def.name.clone(),
            regex: def.regex.clone(),
            category: def.category,
            confidence: Confidence::new(def.confidence),
            action: def.action.clone(),
            target_worker: def.target_worker.clone(),
            tested: def.tested,
            test_success_rate: Confidence::new(def.test_success_rate).value(),
            proposed_by: def.proposed_by,
            metadata: def.metadata.clone(),
            match_count: 0,
            created_at: Utc::now(),
            last_matched: None,
        }
    }

    /// Convert back into the declarative form used by catalog files.
    pub fn to_definition(&self) -> PatternDefinition {
        PatternDefinition {
            name: self.name.clone(),
            regex: self.regex.clone(),
            category: self.category,
            confidence: self.confidence.value(),
            action: self.action.clone(),
            target_worker: self.target_worker.clone(),
            tested: self.tested,
            test_success_rate: self.test_success_rate,
            proposed_by: self.proposed_by,
            metadata: self.metadata.clone(),
            enabled: None,
        }
    }
}

/// Declarative pattern definition: the body of `register` and of each
/// `[[patterns]]` table in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub name: String,
    pub regex: String,
    pub category: PatternCategory,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_worker: Option<String>,
    #[serde(default)]
    pub tested: bool,
    #[serde(default)]
    pub test_success_rate: f64,
    #[serde(default)]
    pub proposed_by: ProposedBy,
    #[serde(default)]
    pub metadata: PatternMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

fn default_confidence() -> f64 {
    DEFAULT_PATTERN_CONFIDENCE
}

impl PatternDefinition {
    /// Minimal manual definition; the rest takes defaults.
    pub fn new(name: impl Into<String>, regex: impl Into<String>, category: PatternCategory) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
            category,
            confidence: DEFAULT_PATTERN_CONFIDENCE,
            action: None,
            target_worker: None,
            tested: false,
            test_success_rate: 0.0,
            proposed_by: ProposedBy::Manual,
            metadata: PatternMetadata::default(),
            enabled: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn tested(mut self, success_rate: f64) -> Self {
        self.tested = true;
        self.test_success_rate = success_rate;
        self
    }

    pub fn with_metadata(mut self, metadata: PatternMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}
