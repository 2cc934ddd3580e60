//! Fixture loader for sift tests: the shared catalog, recorded session logs,
//! learning corpora, and small builders.
//!
//! Files live under this crate's `data/` directory.

use std::path::PathBuf;

use sift_core::pattern::{PatternCategory, PatternDefinition, PatternMetadata};

/// Root directory of the fixture files.
pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Read a fixture file as text.
///
/// # Panics
/// Panics if the file doesn't exist.
pub fn load_text(relative_path: &str) -> String {
    let path = fixture_path(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Raw text of the shared catalog.
pub fn catalog_toml() -> String {
    load_text("catalog.toml")
}

/// Path to the shared catalog.
pub fn catalog_path() -> PathBuf {
    fixture_path("catalog.toml")
}

/// Parsed definitions of the shared catalog.
///
/// # Panics
/// Panics if the catalog does not parse.
pub fn catalog_definitions() -> Vec<PatternDefinition> {
    #[derive(serde::Deserialize)]
    struct File {
        patterns: Vec<PatternDefinition>,
    }
    let file: File = toml::from_str(&catalog_toml())
        .unwrap_or_else(|e| panic!("Failed to parse fixture catalog: {e}"));
    file.patterns
}

/// Lines of a recorded session log (`sessions/<name>.log`), raw, escape codes included.
pub fn session_lines(name: &str) -> Vec<String> {
    load_text(&format!("sessions/{name}.log"))
        .lines()
        .map(str::to_string)
        .collect()
}

/// Lines of a learning corpus (`learning/<name>.txt`).
pub fn learning_lines(name: &str) -> Vec<String> {
    load_text(&format!("learning/{name}.txt"))
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

// --- Builders ---

/// The `bash_command` pattern: tested, confidence 0.95, `safe = false`.
pub fn bash_command() -> PatternDefinition {
    PatternDefinition::new("bash_command", r"⏺ Bash\((.+)\)", PatternCategory::ToolUse)
        .with_confidence(0.95)
        .tested(1.0)
        .with_metadata(PatternMetadata {
            safe: Some(false),
            ..Default::default()
        })
}

/// The `error_exit_code` pattern: tested, confidence 0.99.
pub fn error_exit_code() -> PatternDefinition {
    PatternDefinition::new("error_exit_code", r"Error: Exit code (\d+)", PatternCategory::Error)
        .with_confidence(0.99)
        .tested(1.0)
}

/// A confirmation-prompt pattern with the given trust state.
pub fn prompt(
    name: &str,
    regex: &str,
    tested_rate: Option<f64>,
    safe: Option<bool>,
) -> PatternDefinition {
    let mut def = PatternDefinition::new(name, regex, PatternCategory::ConfirmationPrompt)
        .with_confidence(0.9)
        .with_metadata(PatternMetadata {
            safe,
            ..Default::default()
        });
    if let Some(rate) = tested_rate {
        def = def.tested(rate);
    }
    def
}
