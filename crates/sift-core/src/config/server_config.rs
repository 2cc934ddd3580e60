use serde::{Deserialize, Serialize};

use super::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address of the HTTP surface.
    pub listen: String,
    /// `GET /events` limit when the query omits one.
    pub default_events_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: defaults::DEFAULT_LISTEN.to_string(),
            default_events_limit: defaults::DEFAULT_EVENTS_LIMIT,
        }
    }
}
