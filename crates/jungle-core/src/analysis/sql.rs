//! SQLite engine: records are stored with their nested parts as JSON text
//! and unnested at query time with `json_each`.

use super::types::{
    tagged_ratio, ActivityMatch, FlatRecord, SpeciesCount, SpeciesDetail, SpeciesPopulation,
    TrackingIssue,
};
use super::AnalysisEngine;
use crate::config::{EngineKind, PathsConfig};
use crate::error::{JungleError, Result};
use crate::model::{Expedition, Location, Reserve, Sighting};
use chrono::NaiveDate;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite-backed analysis engine.
///
/// Thread-safe via internal mutex on the connection.
pub struct SqlEngine {
    /// `None` for an in-memory database.
    db_path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqlEngine {
    /// Open (or create) a database file. `":memory:"` opens an in-memory database.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if db_path.as_os_str() == PathsConfig::IN_MEMORY_DB {
            return Self::in_memory();
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| JungleError::Io {
                    message: format!("Failed to create directory {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| JungleError::Database {
            message: format!("Failed to open database {}: {}", db_path.display(), e),
            source: Some(e),
        })?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )?;
        register_functions(&conn)?;
        debug!("Opened database at {}", db_path.display());

        Ok(Self {
            db_path: Some(db_path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        Ok(Self {
            db_path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the database path, if file-backed.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| JungleError::Database {
            message: "Failed to acquire connection lock".to_string(),
            source: None,
        })
    }

    /// Replace the `expeditions` table with `records`.
    ///
    /// Runs in a single transaction: a failure leaves the previous table intact.
    pub fn load(&self, records: &[Expedition]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            "
            DROP TABLE IF EXISTS expeditions;
            CREATE TABLE expeditions (
                expedition_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                expedition_location TEXT NOT NULL,
                reserve TEXT NOT NULL
            );
            CREATE INDEX idx_expeditions_id ON expeditions(expedition_id);
            ",
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO expeditions
                     (expedition_id, start_date, end_date, expedition_location, reserve)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.expedition_id,
                    record.start_date,
                    record.end_date,
                    serde_json::to_string(&record.expedition_location)?,
                    serde_json::to_string(&record.reserve)?,
                ])?;
            }
        }

        tx.commit()?;
        info!("Loaded {} expeditions into SQLite", records.len());
        Ok(records.len())
    }
}

/// Register `round_ratio(tagged, population)`, which rounds exactly like the
/// frame engine and returns NULL for an empty population.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "round_ratio",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| -> rusqlite::Result<Option<f64>> {
            let tagged: u32 = ctx.get(0)?;
            let population: u32 = ctx.get(1)?;
            Ok(tagged_ratio(tagged, population))
        },
    )?;
    Ok(())
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl AnalysisEngine for SqlEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Sql
    }

    fn record_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM expeditions", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn preview(&self, limit: usize) -> Result<Vec<Expedition>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT expedition_id, start_date, end_date, expedition_location, reserve
             FROM expeditions
             ORDER BY rowid
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, NaiveDate>(1)?,
                    row.get::<_, NaiveDate>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(expedition_id, start_date, end_date, location, reserve)| {
                Ok(Expedition {
                    expedition_id,
                    start_date,
                    end_date,
                    expedition_location: serde_json::from_str::<Location>(&location)?,
                    reserve: serde_json::from_str::<Reserve>(&reserve)?,
                })
            })
            .collect()
    }

    fn unique_expedition_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT expedition_id) FROM expeditions",
            [],
            |row| row.get(0),
        )?;
        Ok(count(n))
    }

    fn unique_species_per_expedition(&self) -> Result<Vec<SpeciesCount>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT
                 e.expedition_id,
                 COUNT(DISTINCT json_extract(s.value, '$.name')) AS count_unique_species
             FROM expeditions AS e
             LEFT JOIN json_each(e.reserve, '$.species') AS s ON 1
             GROUP BY e.expedition_id
             ORDER BY e.expedition_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SpeciesCount {
                    expedition_id: row.get(0)?,
                    count_unique_species: count(row.get(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn species_population(&self) -> Result<Vec<SpeciesPopulation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT
                 json_extract(s.value, '$.name') AS name,
                 SUM(json_extract(s.value, '$.population')) AS population
             FROM expeditions AS e, json_each(e.reserve, '$.species') AS s
             GROUP BY name
             ORDER BY population DESC, name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SpeciesPopulation {
                    name: row.get(0)?,
                    population: count(row.get(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn tracking_issues(&self) -> Result<Vec<TrackingIssue>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "WITH species_data AS (
                 SELECT
                     e.rowid AS record_order,
                     s.key AS species_order,
                     json_extract(s.value, '$.name') AS name,
                     json_extract(s.value, '$.population') AS population,
                     json_extract(s.value, '$.tracking.tagged') AS tagged
                 FROM expeditions AS e, json_each(e.reserve, '$.species') AS s
             )
             SELECT
                 name,
                 population,
                 tagged,
                 round_ratio(tagged, population) AS ratio_tagged,
                 tagged - population AS excess_count
             FROM species_data
             WHERE population < tagged
             ORDER BY ratio_tagged IS NOT NULL, ratio_tagged DESC, name ASC,
                      record_order, species_order",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TrackingIssue {
                    name: row.get(0)?,
                    population: row.get(1)?,
                    tagged: row.get(2)?,
                    ratio_tagged: row.get(3)?,
                    excess_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn activity_matches(
        &self,
        target_activity: &str,
        min_activity_count: u64,
    ) -> Result<Vec<ActivityMatch>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "WITH activities AS (
                 SELECT
                     e.expedition_id AS expedition_id,
                     json_extract(si.value, '$.activity') AS activity
                 FROM expeditions AS e,
                      json_each(e.reserve, '$.species') AS s,
                      json_each(s.value, '$.tracking.sightings') AS si
             )
             SELECT expedition_id, COUNT(*) AS target_activity_count
             FROM activities
             WHERE activity = ?1
             GROUP BY expedition_id
             HAVING COUNT(*) > ?2
             ORDER BY target_activity_count DESC, expedition_id ASC",
        )?;
        let min = i64::try_from(min_activity_count).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![target_activity, min], |row| {
                Ok(ActivityMatch {
                    expedition_id: row.get(0)?,
                    target_activity_count: count(row.get(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn species_by_name(&self, names: &[String]) -> Result<Vec<SpeciesDetail>> {
        let targets: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
        let targets = serde_json::to_string(&targets)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT
                 json_extract(s.value, '$.name'),
                 json_extract(s.value, '$.population'),
                 json_extract(s.value, '$.tracking.tagged'),
                 COALESCE(json_extract(s.value, '$.tracking.sightings'), '[]')
             FROM expeditions AS e, json_each(e.reserve, '$.species') AS s
             WHERE lower(json_extract(s.value, '$.name')) IN (SELECT value FROM json_each(?1))
             ORDER BY e.rowid, s.key",
        )?;
        let rows = stmt
            .query_map(params![targets], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(name, population, tagged, sightings)| {
                Ok(SpeciesDetail {
                    name,
                    population,
                    tagged,
                    sightings: serde_json::from_str::<Vec<Sighting>>(&sightings)?,
                })
            })
            .collect()
    }

    fn flatten(&self) -> Result<Vec<FlatRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT
                 e.expedition_id,
                 e.start_date,
                 e.end_date,
                 json_extract(e.expedition_location, '$.latitude'),
                 json_extract(e.expedition_location, '$.longitude'),
                 json_extract(e.reserve, '$.name'),
                 json_extract(e.reserve, '$.location.latitude'),
                 json_extract(e.reserve, '$.location.longitude'),
                 json_extract(e.reserve, '$.environmental_conditions.rainfall_mm.high'),
                 json_extract(e.reserve, '$.environmental_conditions.rainfall_mm.low'),
                 json_extract(s.value, '$.name'),
                 json_extract(s.value, '$.population'),
                 json_extract(s.value, '$.tracking.tagged'),
                 json_extract(si.value, '$.date'),
                 json_extract(si.value, '$.location.latitude'),
                 json_extract(si.value, '$.location.longitude'),
                 json_extract(si.value, '$.activity')
             FROM expeditions AS e
             LEFT JOIN json_each(e.reserve, '$.species') AS s ON 1
             LEFT JOIN json_each(s.value, '$.tracking.sightings') AS si ON 1
             ORDER BY e.rowid, s.key, si.key",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FlatRecord {
                    expedition_id: row.get(0)?,
                    start_date: row.get(1)?,
                    end_date: row.get(2)?,
                    expedition_latitude: row.get(3)?,
                    expedition_longitude: row.get(4)?,
                    reserve_name: row.get(5)?,
                    reserve_latitude: row.get(6)?,
                    reserve_longitude: row.get(7)?,
                    rainfall_high_mm: row.get(8)?,
                    rainfall_low_mm: row.get(9)?,
                    species_name: row.get(10)?,
                    population: row.get(11)?,
                    tagged: row.get(12)?,
                    sighting_date: row.get(13)?,
                    sighting_latitude: row.get(14)?,
                    sighting_longitude: row.get(15)?,
                    activity: row.get(16)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Flattened {} rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Species, Tracking};
    use tempfile::TempDir;

    fn here() -> Location {
        Location {
            latitude: 1.5,
            longitude: -2.25,
        }
    }

    fn expedition(id: &str, species: Vec<Species>) -> Expedition {
        Expedition {
            expedition_id: id.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            expedition_location: here(),
            reserve: Reserve {
                name: "Reserve".to_string(),
                location: here(),
                species,
                environmental_conditions: None,
            },
        }
    }

    fn species(name: &str, population: u32, tagged: u32, activities: &[&str]) -> Species {
        Species {
            name: name.to_string(),
            population,
            tracking: Tracking {
                tagged,
                sightings: activities
                    .iter()
                    .map(|a| Sighting {
                        date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                        location: here(),
                        activity: a.to_string(),
                    })
                    .collect(),
            },
        }
    }

    fn loaded() -> SqlEngine {
        let engine = SqlEngine::in_memory().unwrap();
        engine
            .load(&[
                expedition("E1", vec![species("Ursus", 7, 3, &["hunting", "hunting", "hunting"])]),
                expedition("E2", vec![species("Ursus", 3, 7, &["sleeping"])]),
                expedition("E3", vec![]),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn test_load_replaces_table() {
        let engine = loaded();
        assert_eq!(engine.record_count().unwrap(), 3);
        engine.load(&[expedition("E9", vec![])]).unwrap();
        assert_eq!(engine.record_count().unwrap(), 1);
    }

    #[test]
    fn test_queries_on_loaded_table() {
        let engine = loaded();
        assert_eq!(engine.unique_expedition_count().unwrap(), 3);

        let counts = engine.unique_species_per_expedition().unwrap();
        assert_eq!(counts.last().unwrap().expedition_id, "E3");
        assert_eq!(counts.last().unwrap().count_unique_species, 0);

        let population = engine.species_population().unwrap();
        assert_eq!(population[0].population, 10);

        let issues = engine.tracking_issues().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].ratio_tagged, Some(2.33));
        assert_eq!(issues[0].excess_count, 4);

        let matches = engine.activity_matches("hunting", 2).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].expedition_id, "E1");
    }

    #[test]
    fn test_ratio_rounding_matches_frame_on_half_cent() {
        let engine = SqlEngine::in_memory().unwrap();
        engine
            .load(&[expedition(
                "E1",
                vec![species("Ursus", 40, 43, &[]), species("Lynx", 40, 53, &[])],
            )])
            .unwrap();

        let issues = engine.tracking_issues().unwrap();
        let ratios: Vec<_> = issues.iter().map(|i| (i.name.as_str(), i.ratio_tagged)).collect();
        assert_eq!(
            ratios,
            vec![
                ("Lynx", tagged_ratio(53, 40)),
                ("Ursus", tagged_ratio(43, 40)),
            ]
        );
        assert_eq!(issues[1].ratio_tagged, Some(1.08));
    }

    #[test]
    fn test_activity_parameter_is_bound_not_interpolated() {
        let engine = loaded();
        let rows = engine.activity_matches("x' OR '1'='1", 0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_preview_roundtrips_records() {
        let engine = loaded();
        let preview = engine.preview(1).unwrap();
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].expedition_id, "E1");
        assert_eq!(preview[0].reserve.species[0].tracking.sightings.len(), 3);
    }

    #[test]
    fn test_file_backed_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("jungle.db");
        {
            let engine = SqlEngine::open(&db_path).unwrap();
            engine.load(&[expedition("E1", vec![])]).unwrap();
            assert_eq!(engine.db_path(), Some(db_path.as_path()));
        }
        let reopened = SqlEngine::open(&db_path).unwrap();
        assert_eq!(reopened.record_count().unwrap(), 1);
        assert!(reopened.tracking_issues().unwrap().is_empty());
    }

    #[test]
    fn test_memory_path_alias() {
        let engine = SqlEngine::open(PathsConfig::IN_MEMORY_DB).unwrap();
        assert!(engine.db_path().is_none());
    }

    #[test]
    fn test_queries_fail_before_load() {
        let engine = SqlEngine::in_memory().unwrap();
        assert!(matches!(
            engine.record_count(),
            Err(JungleError::Database { .. })
        ));
    }
}
