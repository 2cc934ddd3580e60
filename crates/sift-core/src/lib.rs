//! # sift-core
//!
//! Foundation crate for sift.
//! Defines the pattern, chunk, and event types, the storage traits,
//! errors, config, and constants. Every other crate in the workspace depends on this.

pub mod chunk;
pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod models;
pub mod normalize;
pub mod pattern;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use chunk::{Chunk, ChunkId};
pub use config::SiftConfig;
pub use errors::{SiftError, SiftResult};
pub use event::{Captures, DecisionReason, EventMetadata, ExtractionEvent};
pub use pattern::{
    Confidence, Pattern, PatternCategory, PatternDefinition, PatternId, PatternMetadata,
    ProposedBy, RiskLevel,
};
