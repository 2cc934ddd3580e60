//! Raw SQL operations, one module per table.

pub mod chunk_ops;
pub mod match_ops;
pub mod pattern_ops;
