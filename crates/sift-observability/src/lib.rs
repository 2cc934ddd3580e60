//! # sift-observability
//!
//! Subscriber setup plus the named spans and events every sift crate logs
//! through, so field names stay consistent across subsystems.

pub mod tracing_setup;

pub use tracing_setup::{events, init_tracing, init_tracing_from_config, init_tracing_with_filter};
