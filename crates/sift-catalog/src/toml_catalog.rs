//! Declarative TOML catalog files: user-extensible without recompiling.
//!
//! A catalog file is any TOML document with `[[patterns]]` tables, so a full
//! `sift.toml` config doubles as a catalog.

use std::path::Path;

use serde::{Deserialize, Serialize};

use sift_core::errors::{SiftError, SiftResult};
use sift_core::pattern::PatternDefinition;

use crate::validation::validate_batch;

/// A collection of TOML pattern definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub patterns: Vec<PatternDefinition>,
}

/// Loader for TOML catalog files.
pub struct TomlCatalogLoader;

impl TomlCatalogLoader {
    /// Parse and validate. Disabled entries are dropped after validation.
    pub fn load_from_str(toml_str: &str) -> SiftResult<Vec<PatternDefinition>> {
        let file: CatalogFile = toml::from_str(toml_str)
            .map_err(|e| SiftError::ConfigError(format!("catalog parse error: {e}")))?;
        validate_batch(&file.patterns)?;
        Ok(file
            .patterns
            .into_iter()
            .filter(PatternDefinition::is_enabled)
            .collect())
    }

    pub fn load_from_file(path: &Path) -> SiftResult<Vec<PatternDefinition>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SiftError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::load_from_str(&content)
    }

    pub fn to_toml_string(patterns: &[PatternDefinition]) -> SiftResult<String> {
        let file = CatalogFile {
            patterns: patterns.to_vec(),
        };
        toml::to_string_pretty(&file)
            .map_err(|e| SiftError::ConfigError(format!("catalog serialize error: {e}")))
    }

    /// Write through a temp file and rename, so readers never see a torn file.
    pub fn write_to_file(path: &Path, patterns: &[PatternDefinition]) -> SiftResult<()> {
        let content = Self::to_toml_string(patterns)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| {
            SiftError::ConfigError(format!("failed to write {}: {e}", tmp.display()))
        })?;
        std::fs::rename(&tmp, path).map_err(|e| {
            SiftError::ConfigError(format!("failed to replace {}: {e}", path.display()))
        })
    }
}
