//! NDJSON reader.

use super::{Dataset, InvalidRecordPolicy, ReadOptions};
use crate::config::PathsConfig;
use crate::error::{JungleError, Result};
use crate::model::Expedition;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Read every record under `path`.
///
/// `path` may be a single file or a directory. Directories are walked
/// recursively and their NDJSON files read in sorted path order.
pub fn read_dataset(path: &Path, options: &ReadOptions) -> Result<Dataset> {
    let files = collect_input_files(path)?;
    let mut dataset = Dataset::default();

    for file in files {
        let handle = File::open(&file).map_err(|e| JungleError::io_with_path(e, &file))?;
        let (records, skipped) = parse_ndjson(BufReader::new(handle), &file, options)?;
        debug!(
            "Read {} records from {} ({} skipped)",
            records.len(),
            file.display(),
            skipped
        );
        dataset.records.extend(records);
        dataset.skipped += skipped;
        dataset.sources.push(file);
    }

    info!(
        "Loaded {} expeditions from {} file(s)",
        dataset.records.len(),
        dataset.sources.len()
    );
    if dataset.skipped > 0 {
        warn!("Skipped {} invalid record(s)", dataset.skipped);
    }

    Ok(dataset)
}

/// Resolve `path` into the list of files to read.
pub fn collect_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(JungleError::FileNotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| JungleError::Io {
            message: format!("Failed to walk {}: {}", path.display(), e),
            path: e.path().map(Path::to_path_buf),
            source: e.into_io_error(),
        })?;
        if entry.file_type().is_file() && has_input_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        warn!("No NDJSON files found under {}", path.display());
    }
    Ok(files)
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PathsConfig::INPUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Decode NDJSON from `reader`, returning the records and the skipped count.
///
/// `origin` is used for error messages only.
pub fn parse_ndjson<R: BufRead>(
    reader: R,
    origin: &Path,
    options: &ReadOptions,
) -> Result<(Vec<Expedition>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| JungleError::io_with_path(e, origin))?;
        if line.trim().is_empty() {
            continue;
        }

        match decode_line(&line, origin, line_no) {
            Ok(record) => records.push(record),
            Err(err) if err.is_record_error() && options.on_invalid == InvalidRecordPolicy::Skip => {
                warn!("Skipping {}:{}: {}", origin.display(), line_no, err);
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok((records, skipped))
}

fn decode_line(line: &str, origin: &Path, line_no: usize) -> Result<Expedition> {
    let record: Expedition =
        serde_json::from_str(line).map_err(|e| JungleError::json_at(e, origin, line_no))?;
    record.validate().map_err(|err| match err {
        JungleError::Validation { field, message } => JungleError::Validation {
            field,
            message: format!("{} ({}:{})", message, origin.display(), line_no),
        },
        other => other,
    })?;
    Ok(record)
}
