//! Background writer for match history.

mod match_writer;

pub use match_writer::{MatchWriter, MatchWriterStats, DEFAULT_CHANNEL_CAPACITY};
