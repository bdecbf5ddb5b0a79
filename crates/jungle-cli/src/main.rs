//! Jungle CLI - runs the expedition analyses from the command line.
//!
//! `jungle frame` and `jungle sql` print the full report for one engine;
//! `jungle compare` runs both and exits non-zero when they disagree.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jungle_core::config::{AnalysisConfig, PathsConfig};
use jungle_core::JungleError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "jungle")]
#[command(about = "Analyse nested expedition NDJSON with a frame engine or a SQL engine")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run the analyses with the in-memory frame engine
    Frame(RunArgs),

    /// Run the analyses with the SQLite engine
    Sql {
        #[command(flatten)]
        run: RunArgs,

        /// Database file (":memory:" for a throwaway database)
        #[arg(long, env = "JUNGLE_DB", default_value = PathsConfig::DEFAULT_DB_FILE)]
        db: PathBuf,
    },

    /// Run both engines and fail if their results differ
    Compare(RunArgs),
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// NDJSON file, or directory of *.jsonl / *.ndjson files
    #[arg(short, long, env = "JUNGLE_INPUT", default_value = PathsConfig::DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Sighting activity to count per expedition
    #[arg(long, default_value = AnalysisConfig::DEFAULT_TARGET_ACTIVITY)]
    pub target_activity: String,

    /// Report expeditions with more matching sightings than this
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_MIN_ACTIVITY_COUNT)]
    pub min_activity_count: u64,

    /// Species name to look up (repeatable; case-insensitive)
    #[arg(long = "species")]
    pub species: Vec<String>,

    /// Number of records shown in the preview table
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip records that fail to parse or validate instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn init_logging(debug: bool) {
    // --debug wins over RUST_LOG; otherwise RUST_LOG, then INFO.
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match commands::run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<JungleError>()
                .map(JungleError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
