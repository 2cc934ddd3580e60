//! # sift-learning
//!
//! Mines the chunk store for recurring structure. Unanalyzed chunks are
//! masked (numbers, quoted strings, paths, clock times), clustered by
//! skeleton, and each qualifying cluster becomes an untested, learned
//! pattern. Chunks of a resolved cluster are marked analyzed and linked to
//! the pattern; everything else waits for a later run.

pub mod calibration;
pub mod clustering;
pub mod derivation;
pub mod masking;
pub mod scheduler;
pub mod worker;

pub use scheduler::LearningScheduler;
pub use worker::{LearningOptions, LearningWorker};
