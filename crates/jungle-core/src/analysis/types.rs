//! Result rows produced by the analyses.

use crate::config::{AnalysisConfig, DisplayConfig};
use crate::model::{Expedition, Sighting};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters shared by every engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub target_activity: String,
    /// Expeditions must exceed this many matching sightings.
    pub min_activity_count: u64,
    pub target_species: Vec<String>,
    pub preview_rows: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            target_activity: AnalysisConfig::DEFAULT_TARGET_ACTIVITY.to_string(),
            min_activity_count: AnalysisConfig::DEFAULT_MIN_ACTIVITY_COUNT,
            target_species: AnalysisConfig::DEFAULT_TARGET_SPECIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_rows: AnalysisConfig::DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// A row that can be rendered as a text table.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| DisplayConfig::NULL.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub expedition_id: String,
    pub count_unique_species: u64,
}

impl Tabular for SpeciesCount {
    fn headers() -> &'static [&'static str] {
        &["expedition_id", "count_unique_species"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.expedition_id.clone(),
            self.count_unique_species.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPopulation {
    pub name: String,
    pub population: u64,
}

impl Tabular for SpeciesPopulation {
    fn headers() -> &'static [&'static str] {
        &["name", "population"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.population.to_string()]
    }
}

/// A species whose tagged count exceeds its known population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingIssue {
    pub name: String,
    pub population: u32,
    pub tagged: u32,
    /// `tagged / population` rounded; `None` when the population is zero.
    pub ratio_tagged: Option<f64>,
    pub excess_count: u32,
}

impl Tabular for TrackingIssue {
    fn headers() -> &'static [&'static str] {
        &["name", "population", "tagged", "ratio_tagged", "excess_count"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.population.to_string(),
            self.tagged.to_string(),
            opt(&self.ratio_tagged),
            self.excess_count.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMatch {
    pub expedition_id: String,
    pub target_activity_count: u64,
}

impl Tabular for ActivityMatch {
    fn headers() -> &'static [&'static str] {
        &["expedition_id", "target_activity_count"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.expedition_id.clone(),
            self.target_activity_count.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDetail {
    pub name: String,
    pub population: u32,
    pub tagged: u32,
    pub sightings: Vec<Sighting>,
}

impl Tabular for SpeciesDetail {
    fn headers() -> &'static [&'static str] {
        &["name", "population", "tagged", "sightings"]
    }

    fn cells(&self) -> Vec<String> {
        let sightings = self
            .sightings
            .iter()
            .map(|s| format!("{} {}", s.date, s.activity))
            .collect::<Vec<_>>()
            .join(", ");
        vec![
            self.name.clone(),
            self.population.to_string(),
            self.tagged.to_string(),
            format!("[{}]", sightings),
        ]
    }
}

/// One fully unnested row: expedition × species × sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub expedition_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub expedition_latitude: f64,
    pub expedition_longitude: f64,
    pub reserve_name: String,
    pub reserve_latitude: f64,
    pub reserve_longitude: f64,
    pub rainfall_high_mm: Option<i32>,
    pub rainfall_low_mm: Option<i32>,
    pub species_name: Option<String>,
    pub population: Option<u32>,
    pub tagged: Option<u32>,
    pub sighting_date: Option<NaiveDate>,
    pub sighting_latitude: Option<f64>,
    pub sighting_longitude: Option<f64>,
    pub activity: Option<String>,
}

impl Tabular for FlatRecord {
    fn headers() -> &'static [&'static str] {
        &[
            "expedition_id",
            "start_date",
            "end_date",
            "expedition_latitude",
            "expedition_longitude",
            "reserve_name",
            "reserve_latitude",
            "reserve_longitude",
            "rainfall_high_mm",
            "rainfall_low_mm",
            "species_name",
            "population",
            "tagged",
            "sighting_date",
            "sighting_latitude",
            "sighting_longitude",
            "activity",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.expedition_id.clone(),
            self.start_date.to_string(),
            self.end_date.to_string(),
            self.expedition_latitude.to_string(),
            self.expedition_longitude.to_string(),
            self.reserve_name.clone(),
            self.reserve_latitude.to_string(),
            self.reserve_longitude.to_string(),
            opt(&self.rainfall_high_mm),
            opt(&self.rainfall_low_mm),
            opt(&self.species_name),
            opt(&self.population),
            opt(&self.tagged),
            opt(&self.sighting_date),
            opt(&self.sighting_latitude),
            opt(&self.sighting_longitude),
            opt(&self.activity),
        ]
    }
}

impl Tabular for Expedition {
    fn headers() -> &'static [&'static str] {
        &[
            "expedition_id",
            "start_date",
            "end_date",
            "expedition_location",
            "reserve",
            "species",
            "sightings",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.expedition_id.clone(),
            self.start_date.to_string(),
            self.end_date.to_string(),
            format!(
                "{{{},{}}}",
                self.expedition_location.latitude, self.expedition_location.longitude
            ),
            self.reserve.name.clone(),
            self.reserve.species.len().to_string(),
            self.sightings().count().to_string(),
        ]
    }
}

/// Round to [`AnalysisConfig::RATIO_DECIMALS`] places, half away from zero.
pub fn round_ratio(value: f64) -> f64 {
    let factor = 10f64.powi(AnalysisConfig::RATIO_DECIMALS);
    (value * factor).round() / factor
}

/// `tagged / population`, or `None` for an empty population.
pub fn tagged_ratio(tagged: u32, population: u32) -> Option<f64> {
    (population != 0).then(|| round_ratio(f64::from(tagged) / f64::from(population)))
}
