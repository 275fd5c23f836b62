//! Wearbase CLI
//!
//! Commands:
//! - ingest: load per-metric CSV batches from a data directory
//! - rollup: rebuild the rollup tiers from the raw tier
//! - query: gap-filled series for one metric over a date range
//! - adherence: coverage statistics for a participant

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use wearbase::types::ParticipantId;
use wearbase::{
    DeltaLoader, FileWatermark, QueryEngine, RawBatch, RollupMaterializer, SampleStore,
    DEFAULT_PARTICIPANT, WEARBASE_VERSION,
};

/// Wearbase - delta ingestion and tiered queries for wearable exports
#[derive(Parser)]
#[command(name = "wearbase")]
#[command(version = WEARBASE_VERSION)]
#[command(about = "Ingest and query wearable sensor time series", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "WEARBASE_DB", default_value = "wearbase.db", global = true)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load per-metric CSV batches from a data directory
    Ingest {
        /// Directory of <metric>.csv batches
        #[arg(long, env = "DATA_DIR", default_value = "/data")]
        data_dir: PathBuf,

        /// Watermark checkpoint file
        #[arg(long, env = "CHECKPOINT_FILE", default_value = "/checkpoint/last_run.json")]
        checkpoint: PathBuf,

        /// Participant the batches belong to
        #[arg(long, default_value_t = DEFAULT_PARTICIPANT)]
        participant: ParticipantId,

        /// Rebuild the rollup tiers after loading
        #[arg(long)]
        rollup: bool,
    },

    /// Rebuild the rollup tiers from the raw tier
    Rollup,

    /// Gap-filled series for one metric over a date range
    Query {
        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,

        #[arg(long)]
        metric: String,

        #[arg(long, default_value_t = DEFAULT_PARTICIPANT)]
        participant: ParticipantId,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Coverage statistics for a participant over a date range
    Adherence {
        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,

        #[arg(long, default_value_t = DEFAULT_PARTICIPANT)]
        participant: ParticipantId,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Ingest {
            data_dir,
            checkpoint,
            participant,
            rollup,
        } => {
            let mut store = SampleStore::open(&cli.db)?;
            let watermark = FileWatermark::new(checkpoint);
            let batches = read_batches(&data_dir)?;

            let summary = DeltaLoader::new(&mut store, &watermark, participant).run(&batches)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if rollup {
                RollupMaterializer::new(&store).materialize_all()?;
            }
            Ok(())
        }

        Commands::Rollup => {
            let store = SampleStore::open(&cli.db)?;
            store.ensure_schema()?;
            RollupMaterializer::new(&store).materialize_all()?;
            Ok(())
        }

        Commands::Query {
            start_date,
            end_date,
            metric,
            participant,
            format,
        } => {
            let store = SampleStore::open(&cli.db)?;
            store.ensure_schema()?;
            let series = QueryEngine::new(&store).series(participant, &metric, start_date, end_date)?;
            print_json(&series, format)
        }

        Commands::Adherence {
            start_date,
            end_date,
            participant,
            format,
        } => {
            let store = SampleStore::open(&cli.db)?;
            store.ensure_schema()?;
            let report = QueryEngine::new(&store).adherence(participant, start_date, end_date)?;
            print_json(&report, format)
        }
    }
}

/// Collect every `*.csv` in the data directory as a batch. Unreadable files
/// are logged and skipped, matching the loader's per-batch tolerance.
fn read_batches(data_dir: &PathBuf) -> Result<Vec<RawBatch>, std::io::Error> {
    let mut batches = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "csv") != Some(true) {
            continue;
        }
        match RawBatch::from_csv_path(&path) {
            Ok(batch) => batches.push(batch),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable batch"),
        }
    }
    batches.sort_by(|a, b| a.metric().cmp(b.metric()));
    Ok(batches)
}

fn print_json<T: serde::Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{text}");
    Ok(())
}
