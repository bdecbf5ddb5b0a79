//! Command implementations.

use crate::{Command, OutputFormat, RunArgs};
use anyhow::{Context, Result};
use jungle_core::{AnalysisParams, EngineKind, Jungle, Report};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

pub(crate) fn run(command: Command) -> Result<()> {
    match command {
        Command::Frame(args) => run_engine(EngineKind::Frame, &args, None),
        Command::Sql { run, db } => run_engine(EngineKind::Sql, &run, Some(db)),
        Command::Compare(args) => run_compare(&args),
    }
}

fn params(args: &RunArgs) -> AnalysisParams {
    let defaults = AnalysisParams::default();
    AnalysisParams {
        target_activity: args.target_activity.clone(),
        min_activity_count: args.min_activity_count,
        target_species: if args.species.is_empty() {
            defaults.target_species
        } else {
            args.species.clone()
        },
        preview_rows: args.preview_rows,
    }
}

fn open(kind: EngineKind, args: &RunArgs, db: Option<PathBuf>) -> Result<Jungle> {
    let mut builder = Jungle::builder(&args.input)
        .engine(kind)
        .skip_invalid(args.skip_invalid);
    if let Some(db) = db {
        builder = builder.db_path(db);
    }
    builder
        .build()
        .with_context(|| format!("Failed to load {}", args.input.display()))
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn run_engine(kind: EngineKind, args: &RunArgs, db: Option<PathBuf>) -> Result<()> {
    let jungle = open(kind, args, db)?;
    let report = jungle
        .report(&params(args))
        .with_context(|| format!("{} engine failed", kind))?;
    print_report(&report, args.format)
}

fn run_compare(args: &RunArgs) -> Result<()> {
    let jungle = open(EngineKind::Frame, args, None)?;
    let check = jungle.cross_check(&params(args))?;

    match args.format {
        OutputFormat::Text => {
            if check.agrees() {
                println!(
                    "Engines agree: {} and {} returned identical results for {} records",
                    check.left.engine, check.right.engine, check.left.record_count
                );
            } else {
                println!("Engines disagree:");
                for mismatch in &check.mismatches {
                    println!(
                        "  {}: {} rows ({}) vs {} rows ({})",
                        mismatch.analysis,
                        mismatch.left_rows,
                        check.left.engine,
                        mismatch.right_rows,
                        check.right.engine
                    );
                }
            }
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "agrees": check.agrees(),
                "left": check.left.engine,
                "right": check.right.engine,
                "record_count": check.left.record_count,
                "mismatches": check.mismatches,
            }))?
        ),
    }

    check.into_result()?;
    info!("Cross-check passed");
    Ok(())
}
