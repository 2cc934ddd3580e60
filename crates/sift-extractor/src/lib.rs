//! # sift-extractor
//!
//! One [`StreamExtractor`] per supervised session. Each line is classified
//! against the catalog snapshot; matches become events, everything else
//! accumulates as a chunk-in-progress for the chunk store.
//!
//! [`session::spawn_session`] wraps an extractor in an async worker that
//! tails a reader, keeps bounded event and decision history, and broadcasts
//! events to subscribers.

pub mod ansi;
pub mod extractor;
pub mod history;
pub mod pending;
pub mod session;

pub use extractor::{ExtractorOptions, StreamExtractor};
pub use history::History;
pub use session::{spawn_session, SessionHandle, SessionOptions};
