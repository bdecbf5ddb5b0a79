//! Centralized configuration for the jungle library.
//!
//! This module provides defaults for the analyses, table rendering and input
//! locations, plus the [`EngineKind`] selector.

use serde::{Deserialize, Serialize};

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const GREETING: &'static str = "Hello from surviving-json-jungle!";
}

/// Default parameters for the analyses.
pub struct AnalysisConfig;

impl AnalysisConfig {
    pub const DEFAULT_TARGET_ACTIVITY: &'static str = "hunting";
    pub const DEFAULT_MIN_ACTIVITY_COUNT: u64 = 2;
    pub const DEFAULT_TARGET_SPECIES: [&'static str; 2] = ["polyphemus", "dromedarius"];
    pub const DEFAULT_PREVIEW_ROWS: usize = 10;
    /// Decimal places kept for the tagged/population ratio.
    pub const RATIO_DECIMALS: i32 = 2;
}

/// Text table rendering limits.
pub struct DisplayConfig;

impl DisplayConfig {
    pub const MAX_ROWS: usize = 100;
    pub const MAX_CELL_WIDTH: usize = 1000;
    pub const NULL: &'static str = "null";
    pub const ELLIPSIS: &'static str = "…";
}

/// Input and storage locations.
pub struct PathsConfig;

impl PathsConfig {
    pub const DEFAULT_INPUT: &'static str = "data/sample.jsonl";
    pub const DEFAULT_DB_FILE: &'static str = "jungle.db";
    pub const IN_MEMORY_DB: &'static str = ":memory:";
    /// File extensions picked up when the input is a directory.
    pub const INPUT_EXTENSIONS: [&'static str; 2] = ["jsonl", "ndjson"];
}

/// Analysis engine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-memory iterator pipelines over the typed records.
    #[default]
    Frame,
    /// Embedded SQLite with the records stored as JSON.
    Sql,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Frame => "frame",
            EngineKind::Sql => "sql",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_names_match_serde() {
        for kind in [EngineKind::Frame, EngineKind::Sql] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
            assert_eq!(serde_json::from_str::<EngineKind>(&json).unwrap(), kind);
        }
        assert_eq!(EngineKind::default(), EngineKind::Frame);
    }

    #[test]
    fn test_defaults_are_reasonable() {
        assert!(AnalysisConfig::DEFAULT_PREVIEW_ROWS <= DisplayConfig::MAX_ROWS);
        assert!(PathsConfig::DEFAULT_INPUT.ends_with(".jsonl"));
    }
}
