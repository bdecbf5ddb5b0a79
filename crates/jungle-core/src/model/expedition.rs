//! Expedition record types.

use crate::error::{JungleError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    fn validate(&self, field: &str) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(JungleError::validation(
                format!("{}.latitude", field),
                format!("{} is outside [-90, 90]", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(JungleError::validation(
                format!("{}.longitude", field),
                format!("{} is outside [-180, 180]", self.longitude),
            ));
        }
        Ok(())
    }
}

/// A high/low reading pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighLow {
    pub high: i32,
    pub low: i32,
}

/// A single observation of a tracked species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub date: NaiveDate,
    pub location: Location,
    pub activity: String,
}

/// Tracking information for a species within a reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    /// Number of individuals carrying a tag.
    pub tagged: u32,
    #[serde(default)]
    pub sightings: Vec<Sighting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    /// Known population in the reserve.
    pub population: u32,
    pub tracking: Tracking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    pub rainfall_mm: HighLow,
    /// Accepts a single reading or a list of readings.
    #[serde(default, deserialize_with = "one_or_many")]
    pub temperature_c: Vec<HighLow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reserve {
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub species: Vec<Species>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_conditions: Option<EnvironmentalConditions>,
}

/// One line of the input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expedition {
    pub expedition_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub expedition_location: Location,
    pub reserve: Reserve,
}

impl Expedition {
    /// Check the semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.expedition_id.trim().is_empty() {
            return Err(JungleError::validation("expedition_id", "must not be empty"));
        }
        if self.end_date < self.start_date {
            return Err(JungleError::validation(
                "end_date",
                format!("{} precedes start_date {}", self.end_date, self.start_date),
            ));
        }
        self.expedition_location.validate("expedition_location")?;
        self.reserve.location.validate("reserve.location")?;

        for (i, species) in self.reserve.species.iter().enumerate() {
            for (j, sighting) in species.tracking.sightings.iter().enumerate() {
                sighting.location.validate(&format!(
                    "reserve.species[{}].tracking.sightings[{}].location",
                    i, j
                ))?;
            }
        }
        Ok(())
    }

    /// Iterate over every sighting of every species in the reserve.
    pub fn sightings(&self) -> impl Iterator<Item = (&Species, &Sighting)> {
        self.reserve
            .species
            .iter()
            .flat_map(|s| s.tracking.sightings.iter().map(move |sighting| (s, sighting)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}
