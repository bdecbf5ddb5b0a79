//! Integration tests for the Jungle public interface.
//!
//! These tests exercise dataset loading from files and directories, both
//! engines through the builder, and the cross-engine check.

use jungle_core::{
    AnalysisParams, EngineKind, InvalidRecordPolicy, Jungle, JungleError, ReadOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/sample.jsonl")
}

fn sample_lines() -> Vec<String> {
    fs::read_to_string(sample_path())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Create a temporary directory with the sample split over nested files.
fn create_split_dataset() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let lines = sample_lines();

    fs::create_dir_all(temp_dir.path().join("jungle/2024")).unwrap();
    fs::write(temp_dir.path().join("jungle/a.jsonl"), lines[..2].join("\n")).unwrap();
    fs::write(
        temp_dir.path().join("jungle/2024/b.ndjson"),
        lines[2..].join("\n\n"),
    )
    .unwrap();
    fs::write(temp_dir.path().join("jungle/notes.txt"), "not data").unwrap();

    temp_dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_open_reads_sample() {
    let jungle = Jungle::open(sample_path()).unwrap();
    assert_eq!(jungle.dataset().len(), 5);
    assert_eq!(jungle.engine().kind(), EngineKind::Frame);
    assert_eq!(jungle.input(), sample_path().as_path());
}

#[test]
fn test_open_fails_for_nonexistent_path() {
    let result = Jungle::open("/nonexistent/path/sample.jsonl");
    assert!(matches!(result, Err(JungleError::FileNotFound(_))));
}

#[test]
fn test_directory_input_reads_sorted_files() {
    let temp_dir = create_split_dataset();
    let jungle = Jungle::open(temp_dir.path().join("jungle")).unwrap();

    let dataset = jungle.dataset();
    assert_eq!(dataset.len(), 5);
    // "2024/b.ndjson" sorts before "a.jsonl".
    assert!(dataset.sources[0].ends_with("2024/b.ndjson"));
    assert!(dataset.sources[1].ends_with("a.jsonl"));
    assert_eq!(dataset.records[0].expedition_id, "EXP-003");
}

#[test]
fn test_empty_directory_is_an_empty_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let jungle = Jungle::builder(temp_dir.path())
        .engine(EngineKind::Sql)
        .build()
        .unwrap();
    let report = jungle.report(&AnalysisParams::default()).unwrap();
    assert_eq!(report.record_count, 0);
    assert_eq!(report.unique_expedition_count, 0);
    assert!(report.flattened.is_empty());
}

#[test]
fn test_strict_read_fails_on_bad_record() {
    let temp_dir = TempDir::new().unwrap();
    let mut lines = sample_lines();
    lines.insert(1, r#"{"expedition_id": "EXP-X"}"#.to_string());
    let path = write_file(temp_dir.path(), "bad.jsonl", &lines.join("\n"));

    match Jungle::open(&path) {
        Err(JungleError::Json { line, .. }) => assert_eq!(line, Some(2)),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected the read to fail"),
    }
}

#[test]
fn test_lenient_read_skips_and_reports() {
    let temp_dir = TempDir::new().unwrap();
    let mut lines = sample_lines();
    lines.push("{truncated".to_string());
    lines.push(lines[0].replace("\"2024-01-20\"", "\"2023-01-20\""));
    let path = write_file(temp_dir.path(), "mixed.jsonl", &lines.join("\n"));

    let jungle = Jungle::builder(&path).skip_invalid(true).build().unwrap();
    assert_eq!(jungle.dataset().len(), 5);
    assert_eq!(jungle.dataset().skipped, 2);

    let report = jungle.report(&AnalysisParams::default()).unwrap();
    assert_eq!(report.skipped, 2);
}

#[test]
fn test_read_options_lenient() {
    assert_eq!(ReadOptions::lenient().on_invalid, InvalidRecordPolicy::Skip);
    assert_eq!(ReadOptions::default().on_invalid, InvalidRecordPolicy::Fail);
}

#[test]
fn test_sql_engine_persists_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("jungle.db");

    let jungle = Jungle::builder(sample_path())
        .engine(EngineKind::Sql)
        .db_path(&db_path)
        .build()
        .unwrap();
    assert_eq!(jungle.engine().record_count().unwrap(), 5);
    assert!(db_path.exists());

    // Rebuilding replaces the table rather than appending to it.
    let again = Jungle::builder(sample_path())
        .engine(EngineKind::Sql)
        .db_path(&db_path)
        .build()
        .unwrap();
    assert_eq!(again.engine().record_count().unwrap(), 5);
}

#[test]
fn test_cross_check_agrees_from_either_side() {
    let params = AnalysisParams::default();
    for kind in [EngineKind::Frame, EngineKind::Sql] {
        let jungle = Jungle::builder(sample_path()).engine(kind).build().unwrap();
        let check = jungle.cross_check(&params).unwrap();
        assert!(check.agrees(), "mismatches: {:?}", check.mismatches);
        assert_eq!(check.left.engine, kind);
        assert_ne!(check.right.engine, kind);
        assert!(check.into_result().is_ok());
    }
}

#[test]
fn test_report_respects_params() {
    let jungle = Jungle::open(sample_path()).unwrap();
    let params = AnalysisParams {
        target_activity: "resting".into(),
        min_activity_count: 0,
        target_species: vec!["leo".into()],
        preview_rows: 1,
    };
    let report = jungle.report(&params).unwrap();
    assert_eq!(report.preview.len(), 1);
    assert_eq!(report.activity_matches.len(), 1);
    assert_eq!(report.activity_matches[0].expedition_id, "EXP-001");
    assert_eq!(report.activity_matches[0].target_activity_count, 2);
    assert_eq!(report.species_by_name.len(), 4);
}
