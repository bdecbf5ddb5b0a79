//! Jungle Core - Headless library for analysing nested expedition NDJSON.
//!
//! The same set of analyses runs on two engines: an in-memory frame engine
//! built from iterator pipelines, and a SQL engine that loads the records
//! into SQLite and unnests them with JSON functions. Reports from the two
//! engines can be cross-checked against each other.
//!
//! # Example
//!
//! ```rust,ignore
//! use jungle_core::{AnalysisParams, EngineKind, Jungle};
//!
//! fn main() -> jungle_core::Result<()> {
//!     let jungle = Jungle::builder("data/sample.jsonl")
//!         .engine(EngineKind::Sql)
//!         .build()?;
//!
//!     let report = jungle.report(&AnalysisParams::default())?;
//!     println!("{}", report.render_text());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod report;
pub mod table;

mod api;

// Re-export commonly used types
pub use analysis::{
    compare_reports, run_analyses, AnalysisEngine, AnalysisParams, FrameEngine, Mismatch,
    SqlEngine,
};
pub use api::JungleBuilder;
pub use config::EngineKind;
pub use dataset::{read_dataset, Dataset, InvalidRecordPolicy, ReadOptions};
pub use error::{JungleError, Result};
pub use model::Expedition;
pub use report::Report;
pub use table::Table;

use std::path::{Path, PathBuf};
use tracing::warn;

/// Main entry point: a dataset paired with the engine that analyses it.
pub struct Jungle {
    input: PathBuf,
    dataset: Dataset,
    engine: Box<dyn AnalysisEngine>,
}

/// Reports from both engines over the same dataset.
#[derive(Debug, Clone)]
pub struct CrossCheck {
    pub left: Report,
    pub right: Report,
    pub mismatches: Vec<Mismatch>,
}

impl CrossCheck {
    pub fn agrees(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Turn disagreement into an [`JungleError::EngineMismatch`].
    pub fn into_result(self) -> Result<Self> {
        if self.agrees() {
            Ok(self)
        } else {
            Err(JungleError::EngineMismatch {
                analyses: self
                    .mismatches
                    .iter()
                    .map(|m| m.analysis.to_string())
                    .collect(),
            })
        }
    }
}

impl Jungle {
    /// Start configuring a new instance reading from `input`.
    pub fn builder(input: impl Into<PathBuf>) -> JungleBuilder {
        JungleBuilder::new(input)
    }

    /// Read `input` strictly and analyse it with the frame engine.
    pub fn open(input: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(input).build()
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn engine(&self) -> &dyn AnalysisEngine {
        self.engine.as_ref()
    }

    /// Run every analysis with the configured engine.
    pub fn report(&self, params: &AnalysisParams) -> Result<Report> {
        let mut report = run_analyses(self.engine(), params)?;
        report.skipped = self.dataset.skipped;
        Ok(report)
    }

    /// Run every analysis with both engines and compare the results.
    ///
    /// The configured engine is on the left; the other engine is built in
    /// memory from the same dataset.
    pub fn cross_check(&self, params: &AnalysisParams) -> Result<CrossCheck> {
        let other_kind = match self.engine.kind() {
            EngineKind::Frame => EngineKind::Sql,
            EngineKind::Sql => EngineKind::Frame,
        };
        let other = api::build_engine(other_kind, &self.dataset, None)?;

        let left = self.report(params)?;
        let mut right = run_analyses(other.as_ref(), params)?;
        right.skipped = self.dataset.skipped;

        let mismatches = compare_reports(&left, &right);
        for mismatch in &mismatches {
            warn!(
                "{} differs: {} has {} rows, {} has {} rows",
                mismatch.analysis, left.engine, mismatch.left_rows, right.engine, mismatch.right_rows
            );
        }

        Ok(CrossCheck {
            left,
            right,
            mismatches,
        })
    }
}
