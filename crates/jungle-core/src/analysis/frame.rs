//! In-memory engine built from iterator pipelines over typed records.

use super::types::{
    tagged_ratio, ActivityMatch, FlatRecord, SpeciesCount, SpeciesDetail, SpeciesPopulation,
    TrackingIssue,
};
use super::AnalysisEngine;
use crate::config::EngineKind;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::model::{Expedition, Sighting, Species};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Engine that evaluates every analysis directly on the parsed records.
#[derive(Debug, Clone, Default)]
pub struct FrameEngine {
    records: Vec<Expedition>,
}

impl FrameEngine {
    pub fn new(records: Vec<Expedition>) -> Self {
        Self { records }
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::new(dataset.records.clone())
    }

    /// Every species entry of every reserve, in input order.
    fn species(&self) -> impl Iterator<Item = &Species> {
        self.records.iter().flat_map(|r| r.reserve.species.iter())
    }
}

/// Ordering for tracking issues: undefined ratios first, then descending.
fn compare_ratio(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.total_cmp(&x),
    }
}

impl AnalysisEngine for FrameEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Frame
    }

    fn record_count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn preview(&self, limit: usize) -> Result<Vec<Expedition>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }

    fn unique_expedition_count(&self) -> Result<u64> {
        let ids: HashSet<&str> = self
            .records
            .iter()
            .map(|r| r.expedition_id.as_str())
            .collect();
        Ok(ids.len() as u64)
    }

    fn unique_species_per_expedition(&self) -> Result<Vec<SpeciesCount>> {
        let mut per_expedition: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for record in &self.records {
            per_expedition
                .entry(record.expedition_id.as_str())
                .or_default()
                .extend(record.reserve.species.iter().map(|s| s.name.as_str()));
        }

        Ok(per_expedition
            .into_iter()
            .map(|(id, names)| SpeciesCount {
                expedition_id: id.to_string(),
                count_unique_species: names.len() as u64,
            })
            .collect())
    }

    fn species_population(&self) -> Result<Vec<SpeciesPopulation>> {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for species in self.species() {
            *totals.entry(species.name.as_str()).or_default() += u64::from(species.population);
        }

        let mut rows: Vec<SpeciesPopulation> = totals
            .into_iter()
            .map(|(name, population)| SpeciesPopulation {
                name: name.to_string(),
                population,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.population
                .cmp(&a.population)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    fn tracking_issues(&self) -> Result<Vec<TrackingIssue>> {
        let mut issues: Vec<TrackingIssue> = self
            .species()
            .filter(|s| s.population < s.tracking.tagged)
            .map(|s| TrackingIssue {
                name: s.name.clone(),
                population: s.population,
                tagged: s.tracking.tagged,
                ratio_tagged: tagged_ratio(s.tracking.tagged, s.population),
                excess_count: s.tracking.tagged - s.population,
            })
            .collect();

        // Stable sort keeps input order among full ties.
        issues.sort_by(|a, b| {
            compare_ratio(a.ratio_tagged, b.ratio_tagged).then_with(|| a.name.cmp(&b.name))
        });
        Ok(issues)
    }

    fn activity_matches(
        &self,
        target_activity: &str,
        min_activity_count: u64,
    ) -> Result<Vec<ActivityMatch>> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for record in &self.records {
            let matches = record
                .sightings()
                .filter(|(_, sighting)| sighting.activity == target_activity)
                .count() as u64;
            if matches > 0 {
                *counts.entry(record.expedition_id.as_str()).or_default() += matches;
            }
        }

        let mut rows: Vec<ActivityMatch> = counts
            .into_iter()
            .filter(|(_, count)| *count > min_activity_count)
            .map(|(id, count)| ActivityMatch {
                expedition_id: id.to_string(),
                target_activity_count: count,
            })
            .collect();
        // BTreeMap order already sorts by ID; the stable sort keeps it for ties.
        rows.sort_by(|a, b| b.target_activity_count.cmp(&a.target_activity_count));
        Ok(rows)
    }

    fn species_by_name(&self, names: &[String]) -> Result<Vec<SpeciesDetail>> {
        let targets: HashSet<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();

        Ok(self
            .species()
            .filter(|s| targets.contains(&s.name.to_ascii_lowercase()))
            .map(|s| SpeciesDetail {
                name: s.name.clone(),
                population: s.population,
                tagged: s.tracking.tagged,
                sightings: s.tracking.sightings.clone(),
            })
            .collect())
    }

    fn flatten(&self) -> Result<Vec<FlatRecord>> {
        let mut rows = Vec::new();
        for record in &self.records {
            if record.reserve.species.is_empty() {
                rows.push(flat_row(record, None, None));
                continue;
            }
            for species in &record.reserve.species {
                if species.tracking.sightings.is_empty() {
                    rows.push(flat_row(record, Some(species), None));
                    continue;
                }
                for sighting in &species.tracking.sightings {
                    rows.push(flat_row(record, Some(species), Some(sighting)));
                }
            }
        }
        Ok(rows)
    }
}

fn flat_row(
    record: &Expedition,
    species: Option<&Species>,
    sighting: Option<&Sighting>,
) -> FlatRecord {
    let rainfall = record
        .reserve
        .environmental_conditions
        .as_ref()
        .map(|c| c.rainfall_mm);

    FlatRecord {
        expedition_id: record.expedition_id.clone(),
        start_date: record.start_date,
        end_date: record.end_date,
        expedition_latitude: record.expedition_location.latitude,
        expedition_longitude: record.expedition_location.longitude,
        reserve_name: record.reserve.name.clone(),
        reserve_latitude: record.reserve.location.latitude,
        reserve_longitude: record.reserve.location.longitude,
        rainfall_high_mm: rainfall.map(|r| r.high),
        rainfall_low_mm: rainfall.map(|r| r.low),
        species_name: species.map(|s| s.name.clone()),
        population: species.map(|s| s.population),
        tagged: species.map(|s| s.tracking.tagged),
        sighting_date: sighting.map(|s| s.date),
        sighting_latitude: sighting.map(|s| s.location.latitude),
        sighting_longitude: sighting.map(|s| s.location.longitude),
        activity: sighting.map(|s| s.activity.clone()),
    }
}
