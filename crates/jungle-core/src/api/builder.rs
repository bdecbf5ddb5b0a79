//! Builder for configuring Jungle initialization.

use std::path::PathBuf;

use crate::analysis::{AnalysisEngine, FrameEngine, SqlEngine};
use crate::config::EngineKind;
use crate::dataset::{read_dataset, Dataset, InvalidRecordPolicy, ReadOptions};
use crate::error::Result;
use crate::Jungle;
use tracing::info;

/// Builder for configuring Jungle initialization.
///
/// # Example
///
/// ```rust,ignore
/// use jungle_core::{EngineKind, Jungle};
///
/// let jungle = Jungle::builder("data/sample.jsonl")
///     .engine(EngineKind::Sql)
///     .db_path("jungle.db")
///     .skip_invalid(true)
///     .build()?;
/// ```
pub struct JungleBuilder {
    input: PathBuf,
    engine: EngineKind,
    db_path: Option<PathBuf>,
    read_options: ReadOptions,
}

impl JungleBuilder {
    /// Create a new builder reading from `input` (file or directory).
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            engine: EngineKind::default(),
            db_path: None,
            read_options: ReadOptions::default(),
        }
    }

    /// Select the analysis engine.
    ///
    /// Default: [`EngineKind::Frame`]
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Database file for the SQL engine. Ignored by the frame engine.
    ///
    /// Default: in-memory database
    pub fn db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(db_path.into());
        self
    }

    /// Drop invalid records instead of failing the read.
    ///
    /// Default: `false`
    pub fn skip_invalid(mut self, enable: bool) -> Self {
        self.read_options.on_invalid = if enable {
            InvalidRecordPolicy::Skip
        } else {
            InvalidRecordPolicy::Fail
        };
        self
    }

    /// Read the dataset and prepare the engine.
    pub fn build(self) -> Result<Jungle> {
        let dataset = read_dataset(&self.input, &self.read_options)?;
        let engine = build_engine(self.engine, &dataset, self.db_path)?;
        info!(
            "Prepared {} engine over {} records from {}",
            self.engine,
            dataset.len(),
            self.input.display()
        );

        Ok(Jungle {
            input: self.input,
            dataset,
            engine,
        })
    }
}

/// Create an engine of `kind` holding `dataset`.
pub(crate) fn build_engine(
    kind: EngineKind,
    dataset: &Dataset,
    db_path: Option<PathBuf>,
) -> Result<Box<dyn AnalysisEngine>> {
    Ok(match kind {
        EngineKind::Frame => Box::new(FrameEngine::from_dataset(dataset)),
        EngineKind::Sql => {
            let engine = match db_path {
                Some(path) => SqlEngine::open(path)?,
                None => SqlEngine::in_memory()?,
            };
            engine.load(&dataset.records)?;
            Box::new(engine)
        }
    })
}
