/// sift version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confidence tier reserved for manually curated, tested patterns.
/// Learned proposals are always scored strictly below this.
pub const CURATED_CONFIDENCE_TIER: f64 = 0.9;

/// Lowest confidence a learned proposal can receive.
pub const LEARNED_CONFIDENCE_FLOOR: f64 = 0.3;

/// Highest confidence a learned proposal can receive.
pub const LEARNED_CONFIDENCE_CEILING: f64 = 0.85;

/// Confidence assigned to a pattern definition that omits one.
pub const DEFAULT_PATTERN_CONFIDENCE: f64 = 0.5;

/// Maximum bytes of a single chunk line kept in storage.
pub const MAX_CHUNK_TEXT_BYTES: usize = 4096;

/// Maximum number of chunks handed to one learning run.
pub const MAX_LEARNING_BATCH: usize = 10_000;

/// Feature flags.
pub const FEATURE_MATCH_HISTORY: bool = true;
pub const FEATURE_ANSI_STRIPPING: bool = true;
