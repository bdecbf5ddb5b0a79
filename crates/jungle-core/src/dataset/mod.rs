//! Loading expedition records from NDJSON files.
//!
//! This module provides:
//! - Reading a single file or a directory of `*.jsonl` / `*.ndjson` files
//! - Schema decoding and validation of every record
//! - Strict or lenient handling of invalid records

mod reader;

pub use reader::{collect_input_files, parse_ndjson, read_dataset};

use crate::model::Expedition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do with a line that fails to decode or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRecordPolicy {
    /// Abort the read with the first error.
    #[default]
    Fail,
    /// Log a warning and drop the record.
    Skip,
}

/// Options for reading a dataset.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub on_invalid: InvalidRecordPolicy,
}

impl ReadOptions {
    pub fn lenient() -> Self {
        Self {
            on_invalid: InvalidRecordPolicy::Skip,
        }
    }
}

/// Records read from one or more NDJSON files, in input order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Expedition>,
    /// Files the records were read from.
    pub sources: Vec<PathBuf>,
    /// Number of records dropped under [`InvalidRecordPolicy::Skip`].
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
