//! Collected analysis results and their text/JSON renderings.

use crate::analysis::{
    ActivityMatch, AnalysisParams, FlatRecord, SpeciesCount, SpeciesDetail, SpeciesPopulation,
    Tabular, TrackingIssue,
};
use crate::config::{AppConfig, EngineKind};
use crate::error::Result;
use crate::model::Expedition;
use crate::table::Table;
use serde::Serialize;
use std::fmt::Write;

/// Every analysis result for one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub engine: EngineKind,
    pub record_count: usize,
    /// Invalid records dropped while reading.
    pub skipped: usize,
    pub params: AnalysisParams,
    pub elapsed_ms: f64,
    pub preview: Vec<Expedition>,
    pub unique_expedition_count: u64,
    pub species_per_expedition: Vec<SpeciesCount>,
    pub species_population: Vec<SpeciesPopulation>,
    pub tracking_issues: Vec<TrackingIssue>,
    pub activity_matches: Vec<ActivityMatch>,
    pub species_by_name: Vec<SpeciesDetail>,
    pub flattened: Vec<FlatRecord>,
}

fn section<T: Tabular>(out: &mut String, title: &str, rows: &[T]) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", Table::from_rows(rows));
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable rendering, one titled table per analysis.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", AppConfig::GREETING);
        let _ = writeln!(
            out,
            "Engine: {} ({} records, {} skipped, {:.2}ms)",
            self.engine, self.record_count, self.skipped, self.elapsed_ms
        );

        section(&mut out, "Preview:", &self.preview);
        let _ = writeln!(
            out,
            "Unique expedition count: {}",
            self.unique_expedition_count
        );
        section(
            &mut out,
            "Species count per expedition:",
            &self.species_per_expedition,
        );
        section(&mut out, "Species population:", &self.species_population);
        section(
            &mut out,
            "Tracking issues by species:",
            &self.tracking_issues,
        );
        section(
            &mut out,
            &format!(
                "Activity matches per expedition ({} > {}):",
                self.params.target_activity, self.params.min_activity_count
            ),
            &self.activity_matches,
        );
        section(
            &mut out,
            &format!("Species by name ({}):", self.params.target_species.join(", ")),
            &self.species_by_name,
        );
        section(&mut out, "Flattened view:", &self.flattened);
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::{run_analyses, AnalysisParams, FrameEngine};

    #[test]
    fn test_text_sections_in_order() {
        let report = run_analyses(&FrameEngine::default(), &AnalysisParams::default()).unwrap();
        let text = report.render_text();
        let positions: Vec<usize> = [
            "Hello from surviving-json-jungle!",
            "Engine: frame (0 records",
            "Unique expedition count: 0",
            "Species count per expedition:",
            "Species population:",
            "Tracking issues by species:",
            "Activity matches per expedition (hunting > 2):",
            "Species by name (polyphemus, dromedarius):",
            "Flattened view:",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_json_has_engine_and_params() {
        let report = run_analyses(&FrameEngine::default(), &AnalysisParams::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["engine"], "frame");
        assert_eq!(value["params"]["target_activity"], "hunting");
        assert_eq!(value["unique_expedition_count"], 0);
    }
}
