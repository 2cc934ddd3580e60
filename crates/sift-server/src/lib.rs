//! # sift-server
//!
//! Hosts the running sessions and exposes them over HTTP. The catalog is
//! shared by every session; events, decisions and counters are per session.

pub mod daemon;
pub mod error;
pub mod http;
pub mod registry;

pub use daemon::{Daemon, SessionSource};
pub use error::ApiError;
pub use http::{router, serve, AppState};
pub use registry::{AgentSummary, SessionRegistry};
