//! Top-level sift configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    AutoConfirmConfig, ExtractorConfig, LearningConfig, ObservabilityConfig, ServerConfig,
    StorageConfig,
};
use crate::errors::{SiftError, SiftResult};
use crate::pattern::PatternDefinition;

/// Top-level configuration aggregating all sections plus the seed catalog.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`SIFT_*`)
/// 2. Config file
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SiftConfig {
    pub storage: StorageConfig,
    pub extractor: ExtractorConfig,
    pub auto_confirm: AutoConfirmConfig,
    pub learning: LearningConfig,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
    /// Seed catalog. Loaded into the pattern store at startup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternDefinition>,
}

impl SiftConfig {
    /// Load from an optional file, apply `SIFT_*` overrides, validate.
    pub fn load(path: Option<&Path>) -> SiftResult<Self> {
        let mut config = match path {
            Some(p) => Self::parse_file(p)?,
            None => Self::default(),
        };
        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> SiftResult<Self> {
        let config: SiftConfig = toml::from_str(toml_str)
            .map_err(|e| SiftError::ConfigError(format!("<string>: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML file. No environment overrides.
    pub fn from_file(path: &Path) -> SiftResult<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> SiftResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SiftError::ConfigError(format!("{}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| SiftError::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Validate value ranges. Pattern definitions are validated by the catalog.
    pub fn validate(&self) -> SiftResult<()> {
        let threshold = self.auto_confirm.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid("auto_confirm.threshold", "must be between 0.0 and 1.0"));
        }
        if self.learning.min_group_size == 0 {
            return Err(invalid("learning.min_group_size", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.learning.min_literal_ratio) {
            return Err(invalid("learning.min_literal_ratio", "must be between 0.0 and 1.0"));
        }
        if self.learning.max_write_attempts == 0 {
            return Err(invalid("learning.max_write_attempts", "must be greater than 0"));
        }
        if self.learning.interval_secs == 0 {
            return Err(invalid("learning.interval_secs", "must be greater than 0"));
        }
        if self.storage.read_pool_size == 0 {
            return Err(invalid("storage.read_pool_size", "must be greater than 0"));
        }
        if self.extractor.max_pending_lines == 0 {
            return Err(invalid("extractor.max_pending_lines", "must be greater than 0"));
        }
        if self.extractor.broadcast_capacity == 0 {
            return Err(invalid("extractor.broadcast_capacity", "must be greater than 0"));
        }
        Ok(())
    }

    fn apply_env_overrides(config: &mut SiftConfig) {
        if let Ok(val) = std::env::var("SIFT_DB_PATH") {
            config.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("SIFT_LISTEN") {
            config.server.listen = val;
        }
        if let Ok(val) = std::env::var("SIFT_ENABLE_TRAINING") {
            if let Ok(v) = val.parse::<bool>() {
                config.learning.enable_training = v;
            }
        }
        if let Ok(val) = std::env::var("SIFT_AUTO_CONFIRM_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.auto_confirm.threshold = v;
            }
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> SiftResult<String> {
        toml::to_string_pretty(self).map_err(|e| SiftError::ConfigError(e.to_string()))
    }
}

fn invalid(field: &str, message: &str) -> SiftError {
    SiftError::ConfigError(format!("{field}: {message}"))
}
