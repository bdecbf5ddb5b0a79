//! Analyses over the expedition dataset.
//!
//! Every analysis is defined once by the [`AnalysisEngine`] trait and
//! implemented twice:
//! - [`FrameEngine`]: iterator pipelines over the typed records
//! - [`SqlEngine`]: SQL over the records stored as JSON in SQLite
//!
//! The two engines must agree; [`compare_reports`] checks that they do.

mod compare;
mod frame;
mod sql;
mod types;

pub use compare::{compare_reports, Mismatch};
pub use frame::FrameEngine;
pub use sql::SqlEngine;
pub use types::{
    round_ratio, tagged_ratio, ActivityMatch, AnalysisParams, FlatRecord, SpeciesCount,
    SpeciesDetail, SpeciesPopulation, Tabular, TrackingIssue,
};

use crate::config::EngineKind;
use crate::error::Result;
use crate::model::Expedition;
use crate::report::Report;
use std::time::Instant;
use tracing::{debug, info};

/// Analysis engine trait.
///
/// All operations are synchronous to match rusqlite's API. Row order of every
/// result is part of the contract so that engines can be compared directly.
pub trait AnalysisEngine: Send + Sync {
    /// Which engine this is.
    fn kind(&self) -> EngineKind;

    /// Number of records available to the engine.
    fn record_count(&self) -> Result<usize>;

    /// The first `limit` records in input order.
    fn preview(&self, limit: usize) -> Result<Vec<Expedition>>;

    /// Distinct count of expedition IDs.
    fn unique_expedition_count(&self) -> Result<u64>;

    /// Distinct species names per expedition ID, ordered by ID.
    ///
    /// Expeditions without species report a count of zero.
    fn unique_species_per_expedition(&self) -> Result<Vec<SpeciesCount>>;

    /// Known population of every species summed across expeditions.
    ///
    /// Ordered by population descending, then name.
    fn species_population(&self) -> Result<Vec<SpeciesPopulation>>;

    /// Species entries with more tagged individuals than known population.
    ///
    /// Ordered with undefined ratios first, then by ratio descending, then
    /// name, then input order.
    fn tracking_issues(&self) -> Result<Vec<TrackingIssue>>;

    /// Expeditions with more than `min_activity_count` sightings whose
    /// activity is exactly `target_activity`, across all species.
    ///
    /// Ordered by count descending, then expedition ID.
    fn activity_matches(
        &self,
        target_activity: &str,
        min_activity_count: u64,
    ) -> Result<Vec<ActivityMatch>>;

    /// Species entries whose name matches one of `names`, ignoring ASCII
    /// case, in input order.
    fn species_by_name(&self, names: &[String]) -> Result<Vec<SpeciesDetail>>;

    /// Fully unnested rows, one per sighting.
    ///
    /// A species without sightings, or an expedition without species, still
    /// yields one row with the missing columns set to `None`.
    fn flatten(&self) -> Result<Vec<FlatRecord>>;
}

/// Run every analysis on `engine` and collect the results.
pub fn run_analyses(engine: &dyn AnalysisEngine, params: &AnalysisParams) -> Result<Report> {
    let start = Instant::now();
    let kind = engine.kind();
    info!("Running analyses with the {} engine", kind);

    let record_count = engine.record_count()?;
    let preview = timed(kind, "preview", || engine.preview(params.preview_rows))?;
    let unique_expedition_count = timed(kind, "unique_expedition_count", || {
        engine.unique_expedition_count()
    })?;
    let species_per_expedition = timed(kind, "unique_species_per_expedition", || {
        engine.unique_species_per_expedition()
    })?;
    let species_population = timed(kind, "species_population", || engine.species_population())?;
    let tracking_issues = timed(kind, "tracking_issues", || engine.tracking_issues())?;
    let activity_matches = timed(kind, "activity_matches", || {
        engine.activity_matches(&params.target_activity, params.min_activity_count)
    })?;
    let species_by_name = timed(kind, "species_by_name", || {
        engine.species_by_name(&params.target_species)
    })?;
    let flattened = timed(kind, "flatten", || engine.flatten())?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!("Analyses finished in {:.2}ms", elapsed_ms);

    Ok(Report {
        engine: kind,
        record_count,
        skipped: 0,
        params: params.clone(),
        elapsed_ms,
        preview,
        unique_expedition_count,
        species_per_expedition,
        species_population,
        tracking_issues,
        activity_matches,
        species_by_name,
        flattened,
    })
}

fn timed<T>(kind: EngineKind, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f();
    debug!(
        "{} engine: {} took {:.3}ms",
        kind,
        name,
        start.elapsed().as_secs_f64() * 1000.0
    );
    result
}
