//! Cross-engine comparison of reports.

use super::types::{FlatRecord, TrackingIssue};
use crate::report::Report;
use serde::Serialize;

/// Relative tolerance for floats that went through SQLite's number parser.
const FLOAT_TOLERANCE: f64 = 1e-9;

/// An analysis whose results differ between two reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub analysis: &'static str,
    pub left_rows: usize,
    pub right_rows: usize,
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn close_opt(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => close(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn issue_eq(a: &TrackingIssue, b: &TrackingIssue) -> bool {
    a.name == b.name
        && a.population == b.population
        && a.tagged == b.tagged
        && a.excess_count == b.excess_count
        && close_opt(a.ratio_tagged, b.ratio_tagged)
}

fn flat_eq(a: &FlatRecord, b: &FlatRecord) -> bool {
    a.expedition_id == b.expedition_id
        && a.start_date == b.start_date
        && a.end_date == b.end_date
        && close(a.expedition_latitude, b.expedition_latitude)
        && close(a.expedition_longitude, b.expedition_longitude)
        && a.reserve_name == b.reserve_name
        && close(a.reserve_latitude, b.reserve_latitude)
        && close(a.reserve_longitude, b.reserve_longitude)
        && a.rainfall_high_mm == b.rainfall_high_mm
        && a.rainfall_low_mm == b.rainfall_low_mm
        && a.species_name == b.species_name
        && a.population == b.population
        && a.tagged == b.tagged
        && a.sighting_date == b.sighting_date
        && close_opt(a.sighting_latitude, b.sighting_latitude)
        && close_opt(a.sighting_longitude, b.sighting_longitude)
        && a.activity == b.activity
}

fn rows_eq<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
}

/// List every analysis on which `left` and `right` disagree.
///
/// Engine name and timings are ignored.
pub fn compare_reports(left: &Report, right: &Report) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    let mut check = |analysis: &'static str, same: bool, left_rows: usize, right_rows: usize| {
        if !same {
            mismatches.push(Mismatch {
                analysis,
                left_rows,
                right_rows,
            });
        }
    };

    check(
        "record_count",
        left.record_count == right.record_count,
        left.record_count,
        right.record_count,
    );
    check(
        "preview",
        left.preview == right.preview,
        left.preview.len(),
        right.preview.len(),
    );
    check(
        "unique_expedition_count",
        left.unique_expedition_count == right.unique_expedition_count,
        1,
        1,
    );
    check(
        "unique_species_per_expedition",
        left.species_per_expedition == right.species_per_expedition,
        left.species_per_expedition.len(),
        right.species_per_expedition.len(),
    );
    check(
        "species_population",
        left.species_population == right.species_population,
        left.species_population.len(),
        right.species_population.len(),
    );
    check(
        "tracking_issues",
        rows_eq(&left.tracking_issues, &right.tracking_issues, issue_eq),
        left.tracking_issues.len(),
        right.tracking_issues.len(),
    );
    check(
        "activity_matches",
        left.activity_matches == right.activity_matches,
        left.activity_matches.len(),
        right.activity_matches.len(),
    );
    check(
        "species_by_name",
        left.species_by_name == right.species_by_name,
        left.species_by_name.len(),
        right.species_by_name.len(),
    );
    check(
        "flatten",
        rows_eq(&left.flattened, &right.flattened, flat_eq),
        left.flattened.len(),
        right.flattened.len(),
    );

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run_analyses, AnalysisParams, FrameEngine, SpeciesPopulation};

    #[test]
    fn test_identical_reports_match() {
        let engine = FrameEngine::default();
        let params = AnalysisParams::default();
        let a = run_analyses(&engine, &params).unwrap();
        let b = run_analyses(&engine, &params).unwrap();
        assert!(compare_reports(&a, &b).is_empty());
    }

    #[test]
    fn test_reports_difference() {
        let engine = FrameEngine::default();
        let params = AnalysisParams::default();
        let a = run_analyses(&engine, &params).unwrap();
        let mut b = a.clone();
        b.species_population.push(SpeciesPopulation {
            name: "Extra".into(),
            population: 1,
        });
        let mismatches = compare_reports(&a, &b);
        assert_eq!(
            mismatches,
            vec![Mismatch {
                analysis: "species_population",
                left_rows: 0,
                right_rows: 1
            }]
        );
    }

    #[test]
    fn test_float_tolerance() {
        assert!(close(1.2, 1.2 + 1e-12));
        assert!(!close(1.2, 1.21));
        assert!(close_opt(None, None));
        assert!(!close_opt(Some(1.0), None));
    }
}
