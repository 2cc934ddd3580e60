//! # sift-policy
//!
//! Decides whether a detected confirmation prompt may be answered
//! automatically. Pure functions: nothing here performs the answer, touches
//! storage, or keeps state between calls.

pub mod decision;
pub mod risk;

pub use decision::{initial_metadata, AutoConfirmPolicy, Decision};
pub use risk::{classify_operation, initial_risk};
