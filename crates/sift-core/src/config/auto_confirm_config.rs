use serde::{Deserialize, Serialize};

use super::defaults;

/// Auto-confirm policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoConfirmConfig {
    /// Minimum `test_success_rate` for an automatic yes. Inclusive.
    pub threshold: f64,
}

impl Default for AutoConfirmConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::DEFAULT_AUTO_CONFIRM_THRESHOLD,
        }
    }
}
